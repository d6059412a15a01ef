use crate::event::Event;
use crate::replay::LiveIndex;
use crate::time::{Span, Timestamp};
use crate::types::OpKind;
use std::collections::BTreeMap;

/// Per-operation counts and byte totals of a log
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct DumpSummary {
    pub records: u64,
    pub op_counts: BTreeMap<OpKind, u64>,
    /// Records with an op code outside of the known set
    pub unknown_ops: u64,
    pub total_malloc: u64,
    pub total_calloc: u64,
    /// Sum of the new sizes requested by realloc
    pub total_realloc: u64,
    /// Bytes released by free and by realloc of a live block
    pub total_freed: u64,
    pub first_ts: Option<Timestamp>,
    pub last_ts: Option<Timestamp>,
}

impl DumpSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `event`.
    /// `live` must be the live set *before* the event is replayed so the
    /// size of the released block is still known.
    pub fn observe(&mut self, event: &Event, live: &LiveIndex) {
        self.records += 1;
        self.first_ts.get_or_insert(event.ts_ns);
        self.last_ts = Some(event.ts_ns);

        let Some(kind) = event.op.kind() else {
            self.unknown_ops += 1;
            return;
        };
        *self.op_counts.entry(kind).or_insert(0) += 1;

        let size = event.size();
        match kind {
            OpKind::Malloc => self.total_malloc = self.total_malloc.saturating_add(size),
            OpKind::Calloc => self.total_calloc = self.total_calloc.saturating_add(size),
            OpKind::Realloc => self.total_realloc = self.total_realloc.saturating_add(size),
            OpKind::Free => (),
        }
        if matches!(kind, OpKind::Free | OpKind::Realloc) {
            if let Some(old) = live.get(event.ptr) {
                self.total_freed = self.total_freed.saturating_add(old.size);
            }
        }
    }

    pub fn count(&self, kind: OpKind) -> u64 {
        self.op_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Time between the first and last record
    pub fn span(&self) -> Span {
        match (self.first_ts, self.last_ts) {
            (Some(first), Some(last)) => last.span_since(first),
            _ => Span::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::test_util::ev;
    use crate::replay::Replayer;

    #[test]
    fn totals_follow_the_live_set() {
        let events = vec![
            ev(1, "malloc", 0x10, 100, 1, 0xa),
            ev(2, "calloc", 0x20, 50, 1, 0xa),
            ev(3, "realloc", 0x10, 300, 1, 0xa),
            ev(4, "free", 0x20, 0, 1, 0xa),
            ev(5, "free", 0x99, 0, 1, 0xa),
            ev(6, "?", 0, 0, 1, 0),
        ];

        let mut summary = DumpSummary::new();
        let mut replayer = Replayer::new();
        for e in &events {
            summary.observe(e, replayer.live());
            replayer.apply(e);
        }

        assert_eq!(summary.records, 6);
        assert_eq!(summary.count(OpKind::Malloc), 1);
        assert_eq!(summary.count(OpKind::Free), 2);
        assert_eq!(summary.count(OpKind::Realloc), 1);
        assert_eq!(summary.count(OpKind::Calloc), 1);
        assert_eq!(summary.unknown_ops, 1);
        assert_eq!(summary.total_malloc, 100);
        assert_eq!(summary.total_calloc, 50);
        assert_eq!(summary.total_realloc, 300);
        assert_eq!(summary.total_freed, 150);
        // ts_ns = idx * 1000
        assert_eq!(summary.span(), Span(5000));
    }

    #[test]
    fn empty_log_has_no_span() {
        assert_eq!(DumpSummary::new().span(), Span(0));
    }
}
