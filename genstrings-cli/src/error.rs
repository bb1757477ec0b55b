use thiserror::Error;

/// Anything that stops a command.
#[derive(Error, Debug)]
pub enum CliError {
    /// A flag value that failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Genstrings(#[from] genstrings::Error),
}
