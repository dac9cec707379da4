use std::io::{BufRead, Write};

use colored::Colorize;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::filesystem::{FileSystemError, Tree};
use crate::shell::{Command, CommandError, CommandKind, split_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Line-oriented command loop over a [`Tree`].
///
/// Failed commands are reported on the output and the loop carries on.
/// The loop ends on `quit` or at end of input.
pub struct Shell<R, W> {
    tree: Tree,
    input: R,
    output: W,
    prompt: String,
    color: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(tree: Tree, input: R, output: W) -> Self {
        Self {
            tree,
            input,
            output,
            prompt: String::new(),
            color: false,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn run(&mut self) -> Result<(), ShellError> {
        loop {
            let prompt = self.prompt.clone();
            let Some(line) = self.read_line(&prompt)? else {
                debug!("End of input");
                return Ok(());
            };
            if self.handle_line(&line)? == Flow::Quit {
                debug!("Quit requested");
                return Ok(());
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let Some((keyword, argument)) = split_line(line) else {
            return Ok(Flow::Continue);
        };

        let kind = match keyword.parse::<CommandKind>() {
            Ok(kind) => kind,
            Err(e) => return self.report(e).map(|_| Flow::Continue),
        };

        let prompted;
        let argument = match (argument, kind.argument_prompt()) {
            (None, Some(question)) => {
                prompted = self.read_line(question)?;
                prompted.as_deref()
            }
            (argument, _) => argument,
        };

        match Command::new(kind, argument) {
            Ok(command) => self.execute(command),
            Err(e) => self.report(e).map(|_| Flow::Continue),
        }
    }

    fn execute(&mut self, command: Command) -> Result<Flow, ShellError> {
        debug!("Executing {:?}", command);
        let result = match command {
            Command::Ls => return self.print_listing().map(|_| Flow::Continue),
            Command::Pwd => {
                let path = self.tree.pwd();
                return self.print(&path).map(|_| Flow::Continue);
            }
            Command::Tree => return self.print_tree().map(|_| Flow::Continue),
            Command::Help => return self.print_help().map(|_| Flow::Continue),
            Command::Quit => return Ok(Flow::Quit),
            Command::Mkdir(name) => self.tree.mkdir(&name),
            Command::Touch(name) => self.tree.touch(&name),
            Command::Cd(name) => self.tree.cd(&name),
            Command::Rm(name) => self.tree.rm(&name),
            Command::Rmdir(name) => self.tree.rmdir(&name),
        };

        if let Err(e) = result {
            self.report_filesystem_error(e)?;
        }
        Ok(Flow::Continue)
    }

    fn print_listing(&mut self) -> Result<(), ShellError> {
        for node in self.tree.ls() {
            let entry = node.to_string();
            let written = if self.color && node.is_directory() {
                writeln!(self.output, "{}", entry.blue().bold())
            } else {
                writeln!(self.output, "{}", entry)
            };
            written.context(WriteOutputSnafu)?;
        }
        Ok(())
    }

    fn print_tree(&mut self) -> Result<(), ShellError> {
        for line in self.tree.tree() {
            writeln!(self.output, "{}", line).context(WriteOutputSnafu)?;
        }
        Ok(())
    }

    fn print_help(&mut self) -> Result<(), ShellError> {
        for kind in CommandKind::ALL {
            writeln!(self.output, "{:<6} {}", kind, kind.description())
                .context(WriteOutputSnafu)?;
        }
        Ok(())
    }

    fn report_filesystem_error(&mut self, error: FileSystemError) -> Result<(), ShellError> {
        debug!("Command failed: {:?}", error);
        self.print(&error.to_string())
    }

    fn report(&mut self, error: CommandError) -> Result<(), ShellError> {
        debug!("Rejected input: {:?}", error);
        self.print(&error.to_string())
    }

    fn print(&mut self, text: &str) -> Result<(), ShellError> {
        writeln!(self.output, "{}", text).context(WriteOutputSnafu)
    }

    /// Writes `prompt` (if any) and reads one line without its line ending.
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD instead of failing the
    /// read, so a garbled line is handled like any other command.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        if !prompt.is_empty() {
            write!(self.output, "{}", prompt).context(WriteOutputSnafu)?;
            self.output.flush().context(WriteOutputSnafu)?;
        }

        let mut raw = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut raw)
            .context(ReadInputSnafu)?;
        if read == 0 {
            return Ok(None);
        }
        while let Some(b'\n' | b'\r') = raw.last() {
            raw.pop();
        }
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }
}

#[derive(Debug, Snafu)]
pub enum ShellError {
    #[snafu(display("Failed to read command input"))]
    ReadInputError { source: std::io::Error },
    #[snafu(display("Failed to write command output"))]
    WriteOutputError { source: std::io::Error },
}
