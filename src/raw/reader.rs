use crate::event::Event;
use crate::raw::{Error, RawRecord, RecordFormat};
use crate::time::{Timestamp, WallClock};
use crate::types::{Endianness, Pointer, ReturnAddress, ThreadId};
use byteordered::ByteOrdered;
use std::io::{self, Read};
use tracing::warn;

/// Reads packed records from a binary memhook log
#[derive(Debug)]
pub struct RecordReader<R> {
    r: R,
    format: RecordFormat,
    endianness: Endianness,
    next_idx: i64,
}

impl<R: Read> RecordReader<R> {
    pub fn new(r: R, format: RecordFormat) -> Self {
        Self::with_endianness(r, format, Endianness::Little)
    }

    pub fn with_endianness(r: R, format: RecordFormat, endianness: Endianness) -> Self {
        Self {
            r,
            format,
            endianness,
            next_idx: 0,
        }
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Number of records read so far
    pub fn records(&self) -> u64 {
        self.next_idx as u64
    }

    /// Read the next record, `None` at the end of the log.
    /// A truncated trailing record also ends the log.
    pub fn read_record(&mut self) -> Result<Option<RawRecord>, Error> {
        let mut r = ByteOrdered::new(&mut self.r, byteordered::Endianness::from(self.endianness));

        let ts_ns = match r.read_u64() {
            Ok(ts) => Timestamp(ts),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match read_body(&mut r, self.format, ts_ns) {
            Ok(rec) => {
                self.next_idx += 1;
                Ok(Some(rec))
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(records = self.next_idx, "Ignoring truncated trailing record");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the next record as an event, indexed by its position in the log
    pub fn read_event(&mut self) -> Result<Option<Event>, Error> {
        let idx = self.next_idx;
        Ok(self.read_record()?.map(|rec| rec.to_event(idx)))
    }

    pub fn into_inner(self) -> R {
        self.r
    }
}

fn read_body<R: Read>(
    r: &mut ByteOrdered<R, byteordered::Endianness>,
    format: RecordFormat,
    ts_ns: Timestamp,
) -> io::Result<RawRecord> {
    let wall_ns = if format.has_wall_clock() {
        WallClock(r.read_u64()?)
    } else {
        WallClock::default()
    };
    let tid = ThreadId(r.read_u32()?);
    let op = r.read_u16()?;
    let _pad = r.read_u16()?;
    let ptr = Pointer(r.read_u64()?);
    let arg = r.read_u64()?;
    let retaddr = ReturnAddress(r.read_u64()?);
    Ok(RawRecord {
        ts_ns,
        wall_ns,
        tid,
        op,
        ptr,
        arg,
        retaddr,
    })
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Event, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_event().transpose()
    }
}
