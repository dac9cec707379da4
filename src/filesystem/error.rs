use snafu::Snafu;

/// Validation failures of tree operations. None of them leave the tree
/// partially modified.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FileSystemError {
    #[snafu(display("Name '{}' already exists in current directory", name))]
    DuplicateNameError { name: String },
    #[snafu(display("{} is not a directory", name))]
    NotADirectoryError { name: String },
    #[snafu(display("Directory '{}' not found", name))]
    DirectoryNotFoundError { name: String },
    #[snafu(display("File '{}' not found", name))]
    FileNotFoundError { name: String },
    #[snafu(display("{} is a directory", name))]
    IsADirectoryError { name: String },
    #[snafu(display("{} is not empty", name))]
    DirectoryNotEmptyError { name: String },
}
