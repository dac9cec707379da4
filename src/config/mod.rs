mod config;

pub use config::{ShellConfig, ShellConfigError};
