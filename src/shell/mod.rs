//! Interactive front end: parses command lines and runs them against a tree.

mod command;
mod shell;

pub use command::{Command, CommandError, CommandKind, split_line};
pub use shell::{Shell, ShellError};
