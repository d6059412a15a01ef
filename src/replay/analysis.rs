use crate::event::{EventIndex, EventStamp};
use crate::replay::series::{downsample, Sample};
use crate::time::{Timestamp, WallClock};
use crate::types::{Pointer, ReturnAddress, ThreadId};
use derive_more::Display;
use std::cmp::Ordering;

/// A peak value and the first event that reached it
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Peak {
    pub bytes: u64,
    /// `None` when the counter never rose above zero
    pub at: Option<EventStamp>,
}

impl Peak {
    /// Index of the peak event, -1 when there is none
    pub fn idx(&self) -> EventIndex {
        self.at.as_ref().map(|s| s.idx).unwrap_or(EventIndex(-1))
    }

    pub fn ts_ns(&self) -> Timestamp {
        self.at.as_ref().map(|s| s.ts_ns).unwrap_or_default()
    }

    pub fn wall_ns(&self) -> WallClock {
        self.at.as_ref().map(|s| s.wall_ns).unwrap_or_default()
    }

    pub fn wall_time(&self) -> &str {
        self.at.as_ref().map(|s| s.wall_time.as_str()).unwrap_or("")
    }
}

/// The first event at which global live bytes reached the configured ceiling
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display(fmt = "idx={} ts_ns={} wall_time={} cur_live_bytes={live_bytes}", "at.idx", "at.ts_ns", "at.wall_time")]
pub struct ThresholdCrossing {
    pub at: EventStamp,
    pub live_bytes: u64,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Overview {
    /// Number of events replayed
    pub records: usize,
    pub peak: Peak,
    pub end_live_blocks: usize,
    pub end_live_bytes: u64,
    pub threshold_crossing: Option<ThresholdCrossing>,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ThreadPeak {
    pub tid: ThreadId,
    pub peak: Peak,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SitePeak {
    pub retaddr: ReturnAddress,
    pub peak: Peak,
}

/// An allocation still live at the end of the trace
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LeakCandidate {
    pub ptr: Pointer,
    pub size: u64,
    pub tid: ThreadId,
    pub retaddr: ReturnAddress,
    pub alloc_ts_ns: Timestamp,
    pub alloc_wall_ns: WallClock,
    pub alloc_wall_time: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display)]
pub enum LeakOrder {
    /// Largest first, earlier allocations first among equal sizes
    #[default]
    #[display(fmt = "size-desc")]
    SizeDesc,
    /// Oldest first, larger allocations first among equal times
    #[display(fmt = "time-asc")]
    TimeAsc,
}

impl LeakOrder {
    pub fn compare(self, a: &LeakCandidate, b: &LeakCandidate) -> Ordering {
        let by_size = b.size.cmp(&a.size);
        let by_time = a.alloc_ts_ns.cmp(&b.alloc_ts_ns);
        match self {
            LeakOrder::SizeDesc => by_size.then(by_time),
            LeakOrder::TimeAsc => by_time.then(by_size),
        }
        .then(a.ptr.cmp(&b.ptr))
    }
}

/// Leak candidates at or above a minimum size, in a chosen order
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LeakReport<'a> {
    pub order: LeakOrder,
    pub min_size: u64,
    pub blocks: Vec<&'a LeakCandidate>,
    pub bytes: u64,
}

/// Everything produced by a replay
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Analysis {
    pub overview: Overview,
    /// All threads, descending by peak
    pub threads: Vec<ThreadPeak>,
    /// All call-sites, descending by peak
    pub sites: Vec<SitePeak>,
    /// All live allocations at the end of the trace, descending by size
    pub leaks: Vec<LeakCandidate>,
    /// One sample per event
    pub series: Vec<Sample>,
}

impl Analysis {
    pub fn top_threads(&self, k: usize) -> &[ThreadPeak] {
        &self.threads[..k.min(self.threads.len())]
    }

    pub fn top_sites(&self, k: usize) -> &[SitePeak] {
        &self.sites[..k.min(self.sites.len())]
    }

    /// The time series reduced to about `points` samples, see
    /// [`downsample`](crate::replay::downsample)
    pub fn downsampled_series(&self, points: usize) -> Vec<Sample> {
        downsample(&self.series, points)
    }

    pub fn leak_report(&self, order: LeakOrder, min_size: u64) -> LeakReport<'_> {
        let mut blocks: Vec<&LeakCandidate> =
            self.leaks.iter().filter(|l| l.size >= min_size).collect();
        blocks.sort_by(|a, b| order.compare(a, b));
        let bytes = blocks.iter().fold(0_u64, |acc, l| acc.saturating_add(l.size));
        LeakReport {
            order,
            min_size,
            blocks,
            bytes,
        }
    }
}
