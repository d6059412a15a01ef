//! Replay memhook allocation logs.
//!
//! A log is a sequence of allocator calls (malloc, calloc, realloc, free)
//! recorded per thread with the caller's return address. Replaying it
//! rebuilds the live allocation set and yields the global, per-thread and
//! per-call-site peaks, the live-byte time series and the blocks still
//! live at the end.
//!
//! Logs come either as the CSV produced by the post-processing tools
//! (see [`csv`]) or as the packed binary records of the preload library
//! (see [`raw`]).

pub use config::AnalysisConfig;
pub use event::{Event, EventIndex, EventStamp};
pub use replay::{analyze, Analysis, Replayer};

pub mod config;
pub mod csv;
pub mod event;
pub mod raw;
pub mod replay;
pub mod report;
pub mod time;
pub mod types;
