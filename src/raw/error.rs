use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Encountered and IO error while reading the input stream ({})",
        .0.kind()
    )]
    Io(#[from] io::Error),
}
