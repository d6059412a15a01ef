use crate::event::Event;
use crate::time::{Timestamp, WallClock};
use crate::types::{Pointer, ReturnAddress, ThreadId};
use std::collections::HashMap;

/// An allocation that has been created and not yet freed
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LiveAllocation {
    pub size: u64,
    pub tid: ThreadId,
    pub retaddr: ReturnAddress,
    /// Timestamps of the event that created the allocation
    pub ts_ns: Timestamp,
    pub wall_ns: WallClock,
    pub wall_time: String,
}

impl LiveAllocation {
    /// Record created by `event` with the given (already clamped) size
    pub fn created_by(event: &Event, size: u64) -> Self {
        Self {
            size,
            tid: event.tid,
            retaddr: event.retaddr,
            ts_ns: event.ts_ns,
            wall_ns: event.wall_ns,
            wall_time: event.wall_time.clone(),
        }
    }
}

/// The set of currently live allocations, keyed by pointer identity.
/// There is at most one record per pointer.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct LiveIndex(HashMap<Pointer, LiveAllocation>);

impl LiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `alloc` under `ptr`, returning the record it superseded
    pub fn insert(&mut self, ptr: Pointer, alloc: LiveAllocation) -> Option<LiveAllocation> {
        self.0.insert(ptr, alloc)
    }

    pub fn remove(&mut self, ptr: Pointer) -> Option<LiveAllocation> {
        self.0.remove(&ptr)
    }

    pub fn get(&self, ptr: Pointer) -> Option<&LiveAllocation> {
        self.0.get(&ptr)
    }

    pub fn contains(&self, ptr: Pointer) -> bool {
        self.0.contains_key(&ptr)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of the sizes of every live allocation
    pub fn total_bytes(&self) -> u64 {
        self.0
            .values()
            .fold(0_u64, |acc, a| acc.saturating_add(a.size))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pointer, &LiveAllocation)> {
        self.0.iter()
    }
}
