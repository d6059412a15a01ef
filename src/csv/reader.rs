use crate::csv::{ColumnMap, Error, RowError};
use crate::event::{Event, EventIndex};
use crate::time::{Timestamp, WallClock};
use crate::types::{parse_int, Pointer, ReturnAddress, ThreadId};
use std::io::BufRead;
use std::num::ParseIntError;
use std::str::FromStr;
use tracing::debug;

/// Reads events from a memhook CSV log.
///
/// Rows that fail to parse, including rows that are not valid UTF-8, are
/// dropped and counted; they never end the stream. Only I/O failures of the
/// underlying reader are returned as errors. Quoted fields are supported
/// within a single line.
///
/// Numeric columns are read into the types of the binary record: `tid` must
/// fit a `u32`, `ts_ns` and `wall_ns` must be non-negative and fit a `u64`.
/// Rows outside those ranges are dropped. `arg` accepts any integer and
/// saturates into an `i64`.
#[derive(Debug)]
pub struct TraceReader<R> {
    r: R,
    columns: ColumnMap,
    line: Vec<u8>,
    line_number: u64,
    dropped_rows: u64,
}

impl<R: BufRead> TraceReader<R> {
    /// Read the header row and locate the required columns
    pub fn new(mut r: R) -> Result<Self, Error> {
        let mut line = String::new();
        if r.read_line(&mut line)? == 0 {
            return Err(Error::MissingHeader);
        }
        let header = split_record(trim_eol(&line));
        let columns = ColumnMap::from_header(&header)?;

        Ok(Self {
            r,
            columns,
            line: Vec::new(),
            line_number: 1,
            dropped_rows: 0,
        })
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Number of rows dropped so far because they could not be parsed
    pub fn dropped_rows(&self) -> u64 {
        self.dropped_rows
    }

    /// Read the next well-formed event, `None` at the end of the input
    pub fn read_event(&mut self) -> Result<Option<Event>, Error> {
        loop {
            self.line.clear();
            if self.r.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let parsed = std::str::from_utf8(&self.line)
                .map_err(RowError::InvalidUtf8)
                .map(trim_eol);
            let line = match parsed {
                Ok(line) if line.is_empty() => continue,
                Ok(line) => line,
                Err(e) => {
                    debug!(line = self.line_number, "Dropping malformed row: {e}");
                    self.dropped_rows += 1;
                    continue;
                }
            };

            let fields = split_record(line);
            match parse_event(&self.columns, &fields) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    debug!(line = self.line_number, "Dropping malformed row: {e}");
                    self.dropped_rows += 1;
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.r
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Event, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_event().transpose()
    }
}

/// Build an event from the fields of one row
pub fn parse_event<S: AsRef<str>>(columns: &ColumnMap, fields: &[S]) -> Result<Event, RowError> {
    let field = |i: usize, name: &'static str| {
        fields
            .get(i)
            .map(|f| f.as_ref())
            .ok_or(RowError::MissingField(fields.len(), name))
    };
    let int = |i: usize, name: &'static str| -> Result<i64, RowError> {
        parse_dec(field(i, name)?).map_err(|e| RowError::InvalidInteger(name, e))
    };
    let uint = |i: usize, name: &'static str| -> Result<u64, RowError> {
        parse_dec(field(i, name)?).map_err(|e| RowError::InvalidInteger(name, e))
    };
    let addr = |i: usize, name: &'static str| -> Result<u64, RowError> {
        parse_int(field(i, name)?).map_err(|e| RowError::InvalidInteger(name, e))
    };

    let wall_ns = parse_dec(or_zero(field(columns.wall_ns, "wall_ns")?))
        .map_err(|e| RowError::InvalidInteger("wall_ns", e))?;
    let arg: i128 = parse_dec(or_zero(field(columns.arg, "arg")?))
        .map_err(|e| RowError::InvalidInteger("arg", e))?;
    let arg = i64::try_from(arg).unwrap_or(if arg < 0 { i64::MIN } else { i64::MAX });
    let tid = parse_dec(field(columns.tid, "tid")?)
        .map_err(|e| RowError::InvalidInteger("tid", e))?;

    Ok(Event {
        idx: EventIndex(int(columns.idx, "idx")?),
        ts_ns: Timestamp(uint(columns.ts_ns, "ts_ns")?),
        wall_ns: WallClock(wall_ns),
        wall_time: field(columns.wall_time, "wall_time")?.to_owned(),
        tid: ThreadId(tid),
        op: field(columns.op, "op")?
            .parse()
            .unwrap_or_else(|never| match never {}),
        ptr: Pointer(addr(columns.ptr, "ptr")?),
        arg,
        retaddr: ReturnAddress(addr(columns.retaddr, "retaddr")?),
    })
}

/// Empty numeric fields read as zero
fn or_zero(s: &str) -> &str {
    if s.trim().is_empty() {
        "0"
    } else {
        s
    }
}

fn parse_dec<T: FromStr<Err = ParseIntError>>(s: &str) -> Result<T, ParseIntError> {
    s.trim().parse::<T>()
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Split one CSV line into fields.
/// Double-quoted fields may contain commas and `""` escapes.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut field)),
            (c, _) => field.push(c),
        }
    }
    fields.push(field);
    fields
}
