//! CSV reports of a replay, one file per result collection

pub use error::Error;
pub use tables::{
    write_leaks, write_overview, write_series, write_site_peaks, write_thread_peaks,
    LEAKS_HEADER, OVERVIEW_HEADER, SERIES_HEADER, SITE_PEAKS_HEADER, THREAD_PEAKS_HEADER,
};
pub use writer::{ReportPaths, ReportWriter};

pub mod error;
pub mod tables;
pub mod writer;
