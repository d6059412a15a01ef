use std::io;
use std::num::ParseIntError;
use std::str::Utf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The input is empty, expected a header row")]
    MissingHeader,

    #[error("Missing column: {column}; header={header:?}")]
    MissingColumn {
        column: &'static str,
        header: Vec<String>,
    },

    #[error(
        "Encountered and IO error while reading the input stream ({})",
        .0.kind()
    )]
    Io(#[from] io::Error),
}

/// Reasons a single row is dropped.
/// These never stop a replay.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum RowError {
    #[error("Row has {0} fields, column {1} is out of range")]
    MissingField(usize, &'static str),

    #[error("Invalid integer in column {0}")]
    InvalidInteger(&'static str, #[source] ParseIntError),

    #[error("Row is not valid UTF-8")]
    InvalidUtf8(#[source] Utf8Error),
}
