use crate::event::Event;
use crate::replay::analysis::{
    Analysis, LeakCandidate, LeakOrder, Overview, Peak, SitePeak, ThreadPeak, ThresholdCrossing,
};
use crate::replay::counter::{CounterFamily, PeakCounter};
use crate::replay::live::{LiveAllocation, LiveIndex};
use crate::replay::series::Sample;
use crate::types::{OpKind, Pointer, ReturnAddress, ThreadId};
use tracing::debug;

/// Replays allocation events in order, tracking the live set and the
/// global, per-thread and per-call-site live-byte peaks.
#[derive(Clone, Debug, Default)]
pub struct Replayer {
    /// Global live-byte ceiling, crossing it is latched once
    ceiling: Option<u64>,
    records: usize,
    live: LiveIndex,
    global: PeakCounter,
    threads: CounterFamily<ThreadId>,
    sites: CounterFamily<ReturnAddress>,
    series: Vec<Sample>,
    crossing: Option<ThresholdCrossing>,
}

impl Replayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the first event at which global live bytes reach `ceiling`.
    /// A zero ceiling disables detection.
    pub fn with_ceiling(mut self, ceiling: Option<u64>) -> Self {
        self.ceiling = ceiling.filter(|c| *c > 0);
        self
    }

    pub fn live(&self) -> &LiveIndex {
        &self.live
    }

    pub fn global(&self) -> &PeakCounter {
        &self.global
    }

    pub fn threads(&self) -> &CounterFamily<ThreadId> {
        &self.threads
    }

    pub fn sites(&self) -> &CounterFamily<ReturnAddress> {
        &self.sites
    }

    pub fn series(&self) -> &[Sample] {
        &self.series
    }

    pub fn threshold_crossing(&self) -> Option<&ThresholdCrossing> {
        self.crossing.as_ref()
    }

    /// Number of events applied so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Apply every event of `events`, in order
    pub fn replay<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.apply(&event);
        }
    }

    /// Apply a single event.
    ///
    /// Every event produces exactly one sample of the global live bytes after
    /// the event took effect, including operations that don't touch the live
    /// set.
    pub fn apply(&mut self, event: &Event) {
        self.records += 1;
        self.series.push(Sample {
            idx: event.idx,
            ts_ns: event.ts_ns,
            wall_time: event.wall_time.clone(),
            live_bytes: self.global.current(),
        });

        match event.op.kind() {
            // Realloc is a free of the old block followed by a create under
            // the current event. A non-positive size leaves a zero-byte
            // block live rather than freeing it.
            Some(OpKind::Malloc | OpKind::Calloc | OpKind::Realloc) => {
                self.create(event.ptr, LiveAllocation::created_by(event, event.size()))
            }
            Some(OpKind::Free) => {
                if self.release(event.ptr).is_none() {
                    debug!(ptr = %event.ptr, idx = %event.idx, "Free of untracked pointer");
                }
            }
            None => (),
        }

        self.global.observe(event);
        self.threads.entry(event.tid).observe(event);
        self.sites.entry(event.retaddr).observe(event);

        let live_bytes = self.global.current();
        if let Some(sample) = self.series.last_mut() {
            sample.live_bytes = live_bytes;
        }

        if let Some(ceiling) = self.ceiling {
            if self.crossing.is_none() && live_bytes >= ceiling {
                debug!(idx = %event.idx, live_bytes, ceiling, "Crossed live-byte ceiling");
                self.crossing = Some(ThresholdCrossing {
                    at: event.stamp(),
                    live_bytes,
                });
            }
        }
    }

    /// Install a new record, retracting whatever was live under the same
    /// pointer first so a lost free never double counts.
    fn create(&mut self, ptr: Pointer, alloc: LiveAllocation) {
        if let Some(old) = self.release(ptr) {
            debug!(%ptr, size = old.size, "Superseding live allocation");
        }
        self.global.add(alloc.size);
        self.threads.entry(alloc.tid).add(alloc.size);
        self.sites.entry(alloc.retaddr).add(alloc.size);
        self.live.insert(ptr, alloc);
    }

    fn release(&mut self, ptr: Pointer) -> Option<LiveAllocation> {
        let old = self.live.remove(ptr)?;
        self.retract(&old);
        Some(old)
    }

    fn retract(&mut self, old: &LiveAllocation) {
        self.global.retract(old.size);
        self.threads.entry(old.tid).retract(old.size);
        self.sites.entry(old.retaddr).retract(old.size);
    }

    /// Consume the replayer and assemble the end-of-trace results
    pub fn finish(self) -> Analysis {
        let mut leaks: Vec<LeakCandidate> = self
            .live
            .iter()
            .map(|(ptr, a)| LeakCandidate {
                ptr: *ptr,
                size: a.size,
                tid: a.tid,
                retaddr: a.retaddr,
                alloc_ts_ns: a.ts_ns,
                alloc_wall_ns: a.wall_ns,
                alloc_wall_time: a.wall_time.clone(),
            })
            .collect();
        leaks.sort_by(|a, b| LeakOrder::SizeDesc.compare(a, b));

        let threads = self
            .threads
            .ranked()
            .into_iter()
            .map(|(tid, c)| ThreadPeak {
                tid,
                peak: peak_of(c),
            })
            .collect();
        let sites = self
            .sites
            .ranked()
            .into_iter()
            .map(|(retaddr, c)| SitePeak {
                retaddr,
                peak: peak_of(c),
            })
            .collect();

        let overview = Overview {
            records: self.records,
            peak: peak_of(&self.global),
            end_live_blocks: leaks.len(),
            end_live_bytes: leaks.iter().fold(0_u64, |acc, l| acc.saturating_add(l.size)),
            threshold_crossing: self.crossing,
        };
        debug!(
            records = overview.records,
            peak = overview.peak.bytes,
            end_live_blocks = overview.end_live_blocks,
            "Replay finished"
        );

        Analysis {
            overview,
            threads,
            sites,
            leaks,
            series: self.series,
        }
    }
}

fn peak_of(c: &PeakCounter) -> Peak {
    Peak {
        bytes: c.peak(),
        at: c.peak_at().cloned(),
    }
}

/// Replay `events` from scratch and return the results
pub fn analyze<I>(events: I, ceiling: Option<u64>) -> Analysis
where
    I: IntoIterator<Item = Event>,
{
    let mut r = Replayer::new().with_ceiling(ceiling);
    r.replay(events);
    r.finish()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::test_util::ev;
    use crate::event::EventIndex;
    use pretty_assertions::assert_eq;

    fn replayed(events: Vec<Event>) -> Replayer {
        let mut r = Replayer::new();
        r.replay(events);
        r
    }

    #[test]
    fn malloc_malloc_free_scenario() {
        let a = analyze(
            vec![
                ev(1, "malloc", 0x10, 100, 1, 0xa),
                ev(2, "malloc", 0x20, 50, 2, 0xb),
                ev(3, "free", 0x10, 0, 1, 0xc),
            ],
            None,
        );

        assert_eq!(a.overview.records, 3);
        assert_eq!(a.overview.peak.bytes, 150);
        assert_eq!(a.overview.peak.idx(), EventIndex(2));
        assert_eq!(a.overview.peak.wall_time(), "w2");
        assert_eq!(a.overview.end_live_bytes, 50);
        assert_eq!(a.overview.end_live_blocks, 1);
        assert_eq!(a.leaks.len(), 1);
        assert_eq!(a.leaks[0].ptr, Pointer(0x20));
        assert_eq!(a.leaks[0].size, 50);
        assert_eq!(a.leaks[0].alloc_wall_time, "w2");

        let series: Vec<u64> = a.series.iter().map(|s| s.live_bytes).collect();
        assert_eq!(series, vec![100, 150, 50]);
    }

    #[test]
    fn realloc_of_untracked_pointer_is_a_malloc() {
        let via_realloc = replayed(vec![ev(1, "realloc", 0x30, 30, 4, 0xd)]);
        let via_malloc = replayed(vec![ev(1, "malloc", 0x30, 30, 4, 0xd)]);

        assert_eq!(via_realloc.live(), via_malloc.live());
        assert_eq!(via_realloc.global(), via_malloc.global());
        assert_eq!(via_realloc.series(), via_malloc.series());
    }

    #[test]
    fn realloc_moves_ownership_to_current_event() {
        let r = replayed(vec![
            ev(1, "malloc", 0x10, 100, 1, 0xa),
            ev(2, "realloc", 0x10, 40, 2, 0xb),
        ]);

        assert_eq!(r.global().current(), 40);
        assert_eq!(r.global().peak(), 100);
        assert_eq!(r.threads().current(ThreadId(1)), 0);
        assert_eq!(r.threads().current(ThreadId(2)), 40);
        assert_eq!(r.sites().current(ReturnAddress(0xa)), 0);
        assert_eq!(r.sites().current(ReturnAddress(0xb)), 40);
        let live = r.live().get(Pointer(0x10)).unwrap();
        assert_eq!(live.tid, ThreadId(2));
        assert_eq!(live.wall_time, "w2");
    }

    #[test]
    fn realloc_to_zero_keeps_a_zero_byte_block() {
        let a = analyze(
            vec![
                ev(1, "malloc", 0x10, 100, 1, 0xa),
                ev(2, "realloc", 0x10, 0, 1, 0xa),
            ],
            None,
        );
        assert_eq!(a.overview.end_live_bytes, 0);
        assert_eq!(a.overview.end_live_blocks, 1);
        assert_eq!(a.leaks[0].size, 0);
    }

    #[test]
    fn duplicate_malloc_replaces_without_double_counting() {
        let r = replayed(vec![
            ev(1, "malloc", 0x10, 40, 1, 0xa),
            ev(2, "malloc", 0x10, 60, 2, 0xb),
        ]);

        assert_eq!(r.global().current(), 60);
        assert_eq!(r.global().peak(), 60);
        assert_eq!(r.threads().current(ThreadId(1)), 0);
        assert_eq!(r.threads().current(ThreadId(2)), 60);
        assert_eq!(r.live().len(), 1);
    }

    #[test]
    fn free_of_untracked_pointer_changes_nothing() {
        let mut r = replayed(vec![ev(1, "malloc", 0x10, 40, 1, 0xa)]);
        let global = r.global().clone();
        let live = r.live().clone();

        r.apply(&ev(2, "free", 0x99, 0, 1, 0xa));

        assert_eq!(r.global(), &global);
        assert_eq!(r.live(), &live);
        assert_eq!(r.threads().current(ThreadId(1)), 40);
        assert_eq!(r.series().len(), 2);
        assert_eq!(r.series()[1].live_bytes, 40);
    }

    #[test]
    fn negative_size_is_zero() {
        let r = replayed(vec![ev(1, "calloc", 0x10, -8, 1, 0xa)]);
        assert_eq!(r.global().current(), 0);
        assert_eq!(r.live().get(Pointer(0x10)).unwrap().size, 0);
        assert!(r.global().peak_at().is_none());
    }

    #[test]
    fn unknown_ops_only_produce_samples() {
        let a = analyze(
            vec![
                ev(1, "malloc", 0x10, 10, 1, 0xa),
                ev(2, "mmap", 0x10, 4096, 3, 0xe),
                ev(3, "?", 0x20, 4096, 3, 0xe),
            ],
            None,
        );

        assert_eq!(a.series.len(), 3);
        assert!(a.series.iter().all(|s| s.live_bytes == 10));
        assert_eq!(a.overview.end_live_blocks, 1);

        // The thread and site are still observed, with a zero peak
        let t3 = a.threads.iter().find(|t| t.tid == ThreadId(3)).unwrap();
        assert_eq!(t3.peak.bytes, 0);
        assert_eq!(t3.peak.idx(), EventIndex(-1));
        assert_eq!(t3.peak.wall_time(), "");
        assert_eq!(a.sites.len(), 2);
    }

    #[test]
    fn peaks_record_first_occurrence() {
        let a = analyze(
            vec![
                ev(1, "malloc", 0x10, 100, 1, 0xa),
                ev(2, "free", 0x10, 0, 1, 0xa),
                ev(3, "malloc", 0x20, 100, 1, 0xa),
            ],
            None,
        );
        assert_eq!(a.overview.peak.bytes, 100);
        assert_eq!(a.overview.peak.idx(), EventIndex(1));
        assert_eq!(a.threads[0].peak.idx(), EventIndex(1));
        assert_eq!(a.sites[0].peak.idx(), EventIndex(1));
    }

    #[test]
    fn thread_and_site_rankings() {
        let a = analyze(
            vec![
                ev(1, "malloc", 0x10, 10, 1, 0xa),
                ev(2, "malloc", 0x20, 300, 2, 0xb),
                ev(3, "malloc", 0x30, 20, 1, 0xb),
                ev(4, "free", 0x20, 0, 2, 0xb),
                ev(5, "malloc", 0x40, 30, 3, 0xc),
            ],
            None,
        );

        let threads: Vec<(u32, u64, i64)> = a
            .threads
            .iter()
            .map(|t| (t.tid.0, t.peak.bytes, t.peak.idx().0))
            .collect();
        assert_eq!(threads, vec![(2, 300, 2), (1, 30, 3), (3, 30, 5)]);

        let sites: Vec<(u64, u64, i64)> = a
            .sites
            .iter()
            .map(|s| (s.retaddr.0, s.peak.bytes, s.peak.idx().0))
            .collect();
        assert_eq!(sites, vec![(0xb, 320, 3), (0xc, 30, 5), (0xa, 10, 1)]);

        assert_eq!(a.top_threads(1).len(), 1);
        assert_eq!(a.top_threads(10).len(), 3);
        assert_eq!(a.top_sites(0).len(), 0);
    }

    #[test]
    fn threshold_crossing_is_latched_once() {
        let mut r = Replayer::new().with_ceiling(Some(100));
        r.apply(&ev(1, "malloc", 0x10, 60, 1, 0xa));
        assert!(r.threshold_crossing().is_none());
        r.apply(&ev(2, "malloc", 0x20, 40, 1, 0xa));
        assert_eq!(r.threshold_crossing().map(|c| c.at.idx), Some(EventIndex(2)));
        r.apply(&ev(3, "free", 0x20, 0, 1, 0xa));
        r.apply(&ev(4, "malloc", 0x30, 500, 1, 0xa));
        assert_eq!(r.threshold_crossing().map(|c| c.live_bytes), Some(100));

        let a = r.finish();
        let crossing = a.overview.threshold_crossing.unwrap();
        assert_eq!(crossing.at.idx, EventIndex(2));
        assert_eq!(crossing.live_bytes, 100);

        let disabled = analyze(vec![ev(1, "malloc", 0x10, 60, 1, 0xa)], Some(0));
        assert!(disabled.overview.threshold_crossing.is_none());
        let never = analyze(vec![ev(1, "malloc", 0x10, 60, 1, 0xa)], Some(61));
        assert!(never.overview.threshold_crossing.is_none());
    }

    #[test]
    fn conservation_and_monotone_peaks() {
        let events: Vec<Event> = (0..400_i64)
            .map(|i| {
                let ptr = (i * 7 % 23) as u64;
                let op = match i % 5 {
                    0 | 3 => "malloc",
                    1 => "free",
                    2 => "realloc",
                    _ => "calloc",
                };
                ev(i, op, ptr, (i * 31) % 257 - 16, (i % 4) as u32, (i % 6) as u64)
            })
            .collect();

        let mut r = Replayer::new();
        let mut max_seen = 0;
        let mut last_peak = 0;
        for event in &events {
            r.apply(event);
            let cur = r.global().current();
            assert_eq!(cur, r.live().total_bytes());
            max_seen = max_seen.max(cur);
            assert!(r.global().peak() >= last_peak);
            assert_eq!(r.global().peak(), max_seen);
            last_peak = r.global().peak();
            for (_, c) in r.threads().iter() {
                assert!(c.peak() >= c.current());
            }
        }

        let live_len = r.live().len();
        let a = r.finish();
        assert_eq!(a.leaks.len(), live_len);
        assert_eq!(
            a.leaks.iter().map(|l| l.size).sum::<u64>(),
            a.overview.end_live_bytes
        );
        assert_eq!(a.series.last().unwrap().live_bytes, a.overview.end_live_bytes);
        assert!(a.leaks.windows(2).all(|w| w[0].size >= w[1].size));
    }
}
