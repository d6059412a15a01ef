use crate::csv::ColumnMap;
use crate::event::Event;
use std::io::{self, Write};

/// Write one CSV row, quoting fields that contain a delimiter, quote or
/// line break.
pub fn write_row<W, I, S>(w: &mut W, fields: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i != 0 {
            w.write_all(b",")?;
        }
        let field = field.as_ref();
        if field.contains([',', '"', '\n', '\r']) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Writes events in the memhook CSV log format, header first
#[derive(Debug)]
pub struct EventWriter<W: Write> {
    w: W,
    rows: u64,
}

impl<W: Write> EventWriter<W> {
    pub fn new(mut w: W) -> io::Result<Self> {
        write_row(&mut w, ColumnMap::REQUIRED)?;
        Ok(Self { w, rows: 0 })
    }

    pub fn write_event(&mut self, ev: &Event) -> io::Result<()> {
        write_row(
            &mut self.w,
            [
                ev.idx.to_string(),
                ev.ts_ns.to_string(),
                ev.wall_ns.get_raw().to_string(),
                ev.wall_time.clone(),
                ev.tid.to_string(),
                ev.op.to_string(),
                ev.ptr.to_string(),
                ev.arg.to_string(),
                ev.retaddr.to_string(),
            ],
        )?;
        self.rows += 1;
        Ok(())
    }

    /// Number of events written, excluding the header
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }

    pub fn into_inner(self) -> W {
        self.w
    }
}
