use crate::time::{Timestamp, WallClock};
use crate::types::{Op, Pointer, ReturnAddress, ThreadId};
use derive_more::{Display, From, Into};

/// Position of an event in the log.
/// Unique and strictly increasing across a trace.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From, Into, Display)]
#[display(fmt = "{_0}")]
pub struct EventIndex(pub i64);

/// A single allocator call observed by the hook
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display(fmt = "[{idx}:{ts_ns}]:{tid}:{op}:{ptr}:{arg}:{retaddr}")]
pub struct Event {
    pub idx: EventIndex,
    pub ts_ns: Timestamp,
    pub wall_ns: WallClock,
    /// Wall-clock time as rendered by the recorder
    pub wall_time: String,
    pub tid: ThreadId,
    pub op: Op,
    pub ptr: Pointer,
    /// Requested size for malloc/calloc/realloc, ignored for free.
    /// Signed because some hooks log the raw argument; non-positive
    /// values are treated as zero bytes.
    pub arg: i64,
    pub retaddr: ReturnAddress,
}

impl Event {
    /// Requested size clamped to a byte count
    pub fn size(&self) -> u64 {
        u64::try_from(self.arg).unwrap_or(0)
    }

    pub fn stamp(&self) -> EventStamp {
        EventStamp {
            idx: self.idx,
            ts_ns: self.ts_ns,
            wall_ns: self.wall_ns,
            wall_time: self.wall_time.clone(),
        }
    }
}

/// The point in time an event happened, as recorded against a peak or a
/// threshold crossing.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display)]
#[display(fmt = "{wall_time} (idx={idx})")]
pub struct EventStamp {
    pub idx: EventIndex,
    pub ts_ns: Timestamp,
    pub wall_ns: WallClock,
    pub wall_time: String,
}
