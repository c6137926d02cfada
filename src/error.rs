//! Error types for CTF encoding and decoding.
//!
//! Decoding fails fast: the first problem aborts the whole decode and no
//! partial value is returned. Failures come in two kinds:
//!
//! - **Parse errors**: malformed syntax (a line without `:`, an undefined
//!   `^id` reference, a tabular row with the wrong number of cells). These
//!   carry the 1-based line number of the offending line when it is known.
//! - **Validation errors**: well-formed text whose declared array length
//!   exceeds the rows, entries or column values actually present.
//!
//! Encoding a [`Value`](crate::Value) never fails. Only the typed serde entry
//! points can produce [`Error::Custom`] (from a `Serialize` impl) and the
//! reader/writer helpers can produce [`Error::Io`].
//!
//! ## Examples
//!
//! ```rust
//! use ctf_format::{decode, Error};
//!
//! let err = decode("name Alice").unwrap_err();
//! assert!(matches!(err, Error::Parse { .. }));
//! assert_eq!(err.line(), Some(1));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed CTF syntax.
    #[error("Parse error{}: {message}", location(.line, .column))]
    Parse {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// Syntactically valid input whose declared cardinality does not match
    /// the data that follows it.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error raised through serde
    #[error("Error: {0}")]
    Custom(String),
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(col)) => format!(" at line {}, column {}", line, col),
        (Some(line), None) => format!(" at line {}", line),
        _ => String::new(),
    }
}

impl Error {
    /// Creates a parse error with no location.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ctf_format::Error;
    ///
    /// let err = Error::parse("Undefined reference: ^4");
    /// assert_eq!(err.to_string(), "Parse error: Undefined reference: ^4");
    /// ```
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Creates a parse error located at a 1-based line number.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ctf_format::Error;
    ///
    /// let err = Error::parse_at(7, "Expected ':' in line");
    /// assert!(err.to_string().contains("line 7"));
    /// ```
    pub fn parse_at(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            line: Some(line),
            column: None,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Attaches a line number to a parse error that does not carry one yet.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn at_line(self, at: usize) -> Self {
        match self {
            Error::Parse {
                message,
                line: None,
                column,
            } => Error::Parse {
                message,
                line: Some(at),
                column,
            },
            other => other,
        }
    }

    /// Returns the line number of a parse error, if known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Parse { line, .. } => *line,
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
