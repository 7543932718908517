//! Error type shared by the file readers and the model constructors.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed model, definition, or dump file.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    /// Well-formed input that does not fit the model (wrong sizes, out-of-range indices, ...)
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl Error {
    pub(crate) fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        Error::Invalid(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
