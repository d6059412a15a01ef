use crate::csv::Error;
use tracing::debug;

/// Positions of the required columns within a header row.
/// Columns may appear in any order, extra columns are ignored.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ColumnMap {
    pub idx: usize,
    pub ts_ns: usize,
    pub wall_ns: usize,
    pub wall_time: usize,
    pub tid: usize,
    pub op: usize,
    pub ptr: usize,
    pub arg: usize,
    pub retaddr: usize,
}

impl ColumnMap {
    pub const REQUIRED: [&'static str; 9] = [
        "idx",
        "ts_ns",
        "wall_ns",
        "wall_time",
        "tid",
        "op",
        "ptr",
        "arg",
        "retaddr",
    ];

    /// Locate every required column, failing on the first one that is absent
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self, Error> {
        let find = |column: &'static str| {
            header
                .iter()
                .position(|h| h.as_ref() == column)
                .ok_or_else(|| Error::MissingColumn {
                    column,
                    header: header.iter().map(|h| h.as_ref().to_owned()).collect(),
                })
        };

        let columns = Self {
            idx: find("idx")?,
            ts_ns: find("ts_ns")?,
            wall_ns: find("wall_ns")?,
            wall_time: find("wall_time")?,
            tid: find("tid")?,
            op: find("op")?,
            ptr: find("ptr")?,
            arg: find("arg")?,
            retaddr: find("retaddr")?,
        };
        debug!(?columns, "Found trace columns");
        Ok(columns)
    }
}
