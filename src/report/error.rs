use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to create output directory {}", .0.display())]
    OutputDir(PathBuf, #[source] io::Error),

    #[error("Failed to write {}", .0.display())]
    Write(PathBuf, #[source] io::Error),
}
