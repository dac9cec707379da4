use std::str::FromStr;

use derive_more::Display;
use snafu::{Snafu, ensure};

/// Command keywords understood by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CommandKind {
    #[display("ls")]
    Ls,
    #[display("mkdir")]
    Mkdir,
    #[display("touch")]
    Touch,
    #[display("cd")]
    Cd,
    #[display("rm")]
    Rm,
    #[display("rmdir")]
    Rmdir,
    #[display("pwd")]
    Pwd,
    #[display("tree")]
    Tree,
    #[display("help")]
    Help,
    #[display("quit")]
    Quit,
}

impl CommandKind {
    pub const ALL: [CommandKind; 10] = [
        CommandKind::Ls,
        CommandKind::Mkdir,
        CommandKind::Touch,
        CommandKind::Cd,
        CommandKind::Rm,
        CommandKind::Rmdir,
        CommandKind::Pwd,
        CommandKind::Tree,
        CommandKind::Help,
        CommandKind::Quit,
    ];

    /// Question asked when an argument command is entered without a name.
    pub fn argument_prompt(self) -> Option<&'static str> {
        match self {
            CommandKind::Mkdir | CommandKind::Cd | CommandKind::Rmdir => {
                Some("Enter directory name: ")
            }
            CommandKind::Touch | CommandKind::Rm => Some("Enter file name: "),
            CommandKind::Ls
            | CommandKind::Pwd
            | CommandKind::Tree
            | CommandKind::Help
            | CommandKind::Quit => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CommandKind::Ls => "list the current directory",
            CommandKind::Mkdir => "create a directory",
            CommandKind::Touch => "create a file",
            CommandKind::Cd => "enter a directory, '..' for the parent",
            CommandKind::Rm => "remove a file",
            CommandKind::Rmdir => "remove an empty directory",
            CommandKind::Pwd => "print the current path",
            CommandKind::Tree => "print the current directory recursively",
            CommandKind::Help => "show this help",
            CommandKind::Quit => "save and exit",
        }
    }
}

impl FromStr for CommandKind {
    type Err = CommandError;

    fn from_str(keyword: &str) -> Result<Self, Self::Err> {
        match keyword.to_lowercase().as_str() {
            "ls" => Ok(CommandKind::Ls),
            "mkdir" => Ok(CommandKind::Mkdir),
            "touch" => Ok(CommandKind::Touch),
            "cd" => Ok(CommandKind::Cd),
            "rm" => Ok(CommandKind::Rm),
            "rmdir" => Ok(CommandKind::Rmdir),
            "pwd" => Ok(CommandKind::Pwd),
            "tree" => Ok(CommandKind::Tree),
            "help" => Ok(CommandKind::Help),
            "quit" | "exit" => Ok(CommandKind::Quit),
            _ => UnknownCommandSnafu { keyword }.fail(),
        }
    }
}

/// A fully resolved command, ready to run against a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ls,
    Mkdir(String),
    Touch(String),
    Cd(String),
    Rm(String),
    Rmdir(String),
    Pwd,
    Tree,
    Help,
    Quit,
}

impl Command {
    /// Builds a command from its keyword and argument. Argument commands
    /// need a non-empty name; the argument is ignored for the others.
    pub fn new(kind: CommandKind, argument: Option<&str>) -> Result<Self, CommandError> {
        let name = || -> Result<String, CommandError> {
            let name = argument.map(str::trim).unwrap_or_default();
            ensure!(!name.is_empty(), EmptyNameSnafu);
            Ok(name.to_string())
        };

        Ok(match kind {
            CommandKind::Ls => Command::Ls,
            CommandKind::Mkdir => Command::Mkdir(name()?),
            CommandKind::Touch => Command::Touch(name()?),
            CommandKind::Cd => Command::Cd(name()?),
            CommandKind::Rm => Command::Rm(name()?),
            CommandKind::Rmdir => Command::Rmdir(name()?),
            CommandKind::Pwd => Command::Pwd,
            CommandKind::Tree => Command::Tree,
            CommandKind::Help => Command::Help,
            CommandKind::Quit => Command::Quit,
        })
    }
}

/// Splits an input line into its keyword and the trimmed remainder.
/// Returns `None` for blank lines.
pub fn split_line(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => {
            let rest = rest.trim();
            Some((keyword, (!rest.is_empty()).then_some(rest)))
        }
        None => Some((line, None)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CommandError {
    #[snafu(display("Invalid command"))]
    UnknownCommandError { keyword: String },
    #[snafu(display("Name cannot be empty"))]
    EmptyNameError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("ls", CommandKind::Ls)]
    #[case("LS", CommandKind::Ls)]
    #[case("Mkdir", CommandKind::Mkdir)]
    #[case("rmdir", CommandKind::Rmdir)]
    #[case("exit", CommandKind::Quit)]
    #[case("QUIT", CommandKind::Quit)]
    fn keywords_are_case_insensitive(#[case] keyword: &str, #[case] expected: CommandKind) {
        assert_eq!(keyword.parse::<CommandKind>(), Ok(expected));
    }

    #[test]
    fn unknown_keyword_is_invalid_command() {
        let result = "format".parse::<CommandKind>();
        assert_eq!(
            result,
            Err(CommandError::UnknownCommandError {
                keyword: "format".into()
            })
        );
        assert_eq!(result.unwrap_err().to_string(), "Invalid command");
    }

    #[test]
    fn every_kind_parses_from_its_display_name() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.to_string().parse::<CommandKind>(), Ok(kind));
        }
    }

    #[rstest]
    #[case("", None)]
    #[case("   ", None)]
    #[case("pwd", Some(("pwd", None)))]
    #[case("  cd   docs  ", Some(("cd", Some("docs"))))]
    #[case("touch my notes", Some(("touch", Some("my notes"))))]
    #[case("mkdir \t", Some(("mkdir", None)))]
    fn split_line_cases(#[case] line: &str, #[case] expected: Option<(&str, Option<&str>)>) {
        assert_eq!(split_line(line), expected);
    }

    #[test]
    fn argument_commands_require_a_name() {
        assert_eq!(
            Command::new(CommandKind::Mkdir, None),
            Err(CommandError::EmptyNameError)
        );
        assert_eq!(
            Command::new(CommandKind::Rm, Some("  ")),
            Err(CommandError::EmptyNameError)
        );
        assert_eq!(
            Command::new(CommandKind::Cd, Some("..")),
            Ok(Command::Cd("..".into()))
        );
    }

    #[test]
    fn plain_commands_ignore_arguments() {
        assert_eq!(Command::new(CommandKind::Ls, Some("-la")), Ok(Command::Ls));
    }

    #[test]
    fn prompts_match_argument_kind() {
        assert_eq!(
            CommandKind::Rmdir.argument_prompt(),
            Some("Enter directory name: ")
        );
        assert_eq!(CommandKind::Touch.argument_prompt(), Some("Enter file name: "));
        assert_eq!(CommandKind::Pwd.argument_prompt(), None);
    }
}
