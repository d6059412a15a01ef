//! The CSV trace log, one allocator call per row:
//! `idx,ts_ns,wall_ns,wall_time,tid,op,ptr,arg,retaddr`

pub use columns::ColumnMap;
pub use error::{Error, RowError};
pub use reader::{parse_event, split_record, TraceReader};
pub use writer::{write_row, EventWriter};

pub mod columns;
pub mod error;
pub mod reader;
pub mod writer;
