//! All error types for the genstrings crate.
//!
//! Every parse stops at the first problem it finds and returns one of these.
//! Positioned variants render as `path:line:col: message`, the way compilers
//! report diagnostics, so the CLI can print them verbatim.

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// A position inside a file. Lines are 1-based; `0:0` means "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub fn new(path: impl Into<String>, line: usize, col: usize) -> Self {
        Location {
            path: path.into(),
            line,
            col,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.col)
    }
}

/// What went wrong while turning characters into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape")]
    InvalidEscape,

    #[error("invalid unicode escape")]
    InvalidUnicodeEscape,

    #[error("invalid universal character name")]
    InvalidUniversalCharacterName,

    #[error("invalid UTF-16 escape")]
    InvalidUtf16Escape,

    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),

    #[error("unexpected EOF")]
    UnexpectedEof,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{location}: {kind}")]
    Lex {
        location: Location,
        kind: LexErrorKind,
    },

    #[error("{location}: {message}")]
    Parse { location: Location, message: String },

    #[error("{location}: duplicated key `{key}`")]
    DuplicatedKey { location: Location, key: String },

    #[error("{location}: routine call has empty key")]
    EmptyKey { location: Location },

    #[error("routine call `{key}` at {first} and at {second} have different comments")]
    ConflictingComment {
        key: String,
        first: Location,
        second: Location,
    },

    #[error("{path}: unknown file type")]
    UnknownFileType { path: String },

    #[error("{path}: {message}")]
    File { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a positioned parse error.
    pub fn parse(location: Location, message: impl Into<String>) -> Self {
        Error::Parse {
            location,
            message: message.into(),
        }
    }

    /// Creates an error about a whole file.
    pub fn file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the position the error points at, if it has one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::Lex { location, .. }
            | Error::Parse { location, .. }
            | Error::DuplicatedKey { location, .. }
            | Error::EmptyKey { location } => Some(location),
            Error::ConflictingComment { second, .. } => Some(second),
            Error::UnknownFileType { .. } | Error::File { .. } | Error::Io(_) => None,
        }
    }
}
