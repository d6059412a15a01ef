//! The binary log written by the memhook preload library.
//!
//! Records are packed, fixed size and in the byte order of the traced
//! machine. Version 1 records are 40 bytes, version 2 adds the wall-clock
//! time for 48 bytes. The file has no header, the version is inferred from
//! its length.

pub use error::Error;
pub use reader::RecordReader;
pub use record::{RawRecord, RecordFormat};
pub use summary::DumpSummary;

pub mod error;
pub mod reader;
pub mod record;
pub mod summary;
