use crate::event::{Event, EventStamp};
use std::collections::HashMap;
use std::hash::Hash;

/// Live-byte counter with peak detection.
///
/// The peak only moves when the current value strictly exceeds it, so the
/// recorded event is the first one that reached the peak value.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct PeakCounter {
    current: u64,
    peak: u64,
    peak_at: Option<EventStamp>,
}

impl PeakCounter {
    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn peak(&self) -> u64 {
        self.peak
    }

    /// The event at which the peak was first reached, `None` if the counter
    /// never rose above zero
    pub fn peak_at(&self) -> Option<&EventStamp> {
        self.peak_at.as_ref()
    }

    pub(crate) fn add(&mut self, bytes: u64) {
        self.current = self.current.saturating_add(bytes);
    }

    pub(crate) fn retract(&mut self, bytes: u64) {
        self.current = self.current.saturating_sub(bytes);
    }

    /// Refresh the peak after `event` has been applied.
    /// Returns true if a new peak was recorded.
    pub(crate) fn observe(&mut self, event: &Event) -> bool {
        if self.current > self.peak {
            self.peak = self.current;
            self.peak_at = Some(event.stamp());
            true
        } else {
            false
        }
    }
}

/// A keyed family of counters (per thread, per call-site).
///
/// Keys are created on first reference with a zero counter and remember the
/// order in which they first appeared; rankings break ties on that order.
#[derive(Clone, Debug)]
pub struct CounterFamily<K> {
    index: HashMap<K, usize>,
    counters: Vec<(K, PeakCounter)>,
}

impl<K> Default for CounterFamily<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            counters: Vec::new(),
        }
    }
}

impl<K> CounterFamily<K>
where
    K: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the counter for `key`, inserting a zero counter if absent
    pub fn entry(&mut self, key: K) -> &mut PeakCounter {
        let slot = match self.index.get(&key) {
            Some(slot) => *slot,
            None => {
                let slot = self.counters.len();
                self.index.insert(key, slot);
                self.counters.push((key, PeakCounter::default()));
                slot
            }
        };
        &mut self.counters[slot].1
    }

    pub fn get(&self, key: K) -> Option<&PeakCounter> {
        self.index.get(&key).map(|slot| &self.counters[*slot].1)
    }

    /// Current value for `key`, zero if it was never referenced
    pub fn current(&self, key: K) -> u64 {
        self.get(key).map(PeakCounter::current).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Every key in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (K, &PeakCounter)> {
        self.counters.iter().map(|(k, c)| (*k, c))
    }

    /// Every key sorted by descending peak
    pub fn ranked(&self) -> Vec<(K, &PeakCounter)> {
        let mut ranked: Vec<_> = self.iter().collect();
        // Stable, so equal peaks stay in first-appearance order
        ranked.sort_by(|a, b| b.1.peak().cmp(&a.1.peak()));
        ranked
    }
}
