use crate::event::{Event, EventIndex};
use crate::time::{Timestamp, WallClock};
use crate::types::{Op, OpKind, Pointer, ReturnAddress, ThreadId};
use derive_more::Display;
use tracing::debug;

/// Layout of the packed records written by the hook
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum RecordFormat {
    /// `ts_ns, tid, op, pad, ptr, arg, retaddr`
    #[display(fmt = "v1")]
    V1,
    /// `ts_ns, wall_ns, tid, op, pad, ptr, arg, retaddr`
    #[display(fmt = "v2")]
    V2,
}

impl RecordFormat {
    pub const V1_WIRE_SIZE: u64 = 40;
    pub const V2_WIRE_SIZE: u64 = 48;

    pub const fn wire_size(self) -> u64 {
        match self {
            RecordFormat::V1 => Self::V1_WIRE_SIZE,
            RecordFormat::V2 => Self::V2_WIRE_SIZE,
        }
    }

    /// Infer the format from the total length of a log.
    /// A whole number of v2 records wins, then a whole number of v1 records,
    /// otherwise v2 is assumed and the trailing partial record is ignored.
    pub fn detect(len: u64) -> Self {
        let fmt = if len != 0 && len % Self::V2_WIRE_SIZE == 0 {
            RecordFormat::V2
        } else if len != 0 && len % Self::V1_WIRE_SIZE == 0 {
            RecordFormat::V1
        } else {
            RecordFormat::V2
        };
        debug!(len, format = %fmt, "Detected record format");
        fmt
    }

    /// Number of whole records in a log of `len` bytes
    pub fn record_count(self, len: u64) -> u64 {
        len / self.wire_size()
    }

    pub fn has_wall_clock(self) -> bool {
        self == RecordFormat::V2
    }
}

/// A single record as stored on disk
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RawRecord {
    pub ts_ns: Timestamp,
    /// Always zero for v1 records
    pub wall_ns: WallClock,
    pub tid: ThreadId,
    pub op: u16,
    pub ptr: Pointer,
    pub arg: u64,
    pub retaddr: ReturnAddress,
}

impl RawRecord {
    pub fn op_kind(&self) -> Option<OpKind> {
        OpKind::from_code(self.op)
    }

    /// Convert to an event at position `idx` of the log
    pub fn to_event(&self, idx: i64) -> Event {
        Event {
            idx: EventIndex(idx),
            ts_ns: self.ts_ns,
            wall_ns: self.wall_ns,
            wall_time: self.wall_ns.to_string(),
            tid: self.tid,
            op: self
                .op_kind()
                .map(Op::Known)
                .unwrap_or_else(|| Op::Other(Op::UNKNOWN.to_owned())),
            ptr: self.ptr,
            arg: i64::try_from(self.arg).unwrap_or(i64::MAX),
            retaddr: self.retaddr,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(RecordFormat::detect(48 * 3), RecordFormat::V2);
        assert_eq!(RecordFormat::detect(40 * 3), RecordFormat::V1);
        // Divisible by both, v2 wins
        assert_eq!(RecordFormat::detect(240), RecordFormat::V2);
        assert_eq!(RecordFormat::detect(0), RecordFormat::V2);
        assert_eq!(RecordFormat::detect(50), RecordFormat::V2);
        assert_eq!(RecordFormat::V2.record_count(50), 1);
        assert_eq!(RecordFormat::V1.record_count(120), 3);
    }

    #[test]
    fn unknown_op_codes_become_inert() {
        let rec = RawRecord {
            ts_ns: Timestamp(5),
            wall_ns: WallClock(0),
            tid: ThreadId(3),
            op: 9,
            ptr: Pointer(0x10),
            arg: u64::MAX,
            retaddr: ReturnAddress(0x20),
        };
        let ev = rec.to_event(4);
        assert_eq!(ev.op, Op::Other("?".to_owned()));
        assert_eq!(ev.idx, EventIndex(4));
        assert_eq!(ev.wall_time, "-");
        assert_eq!(ev.arg, i64::MAX);
    }
}
