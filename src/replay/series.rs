use crate::event::EventIndex;
use crate::time::Timestamp;

/// Global live bytes right after an event was applied
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Sample {
    pub idx: EventIndex,
    pub ts_ns: Timestamp,
    pub wall_time: String,
    pub live_bytes: u64,
}

/// Indices selected when reducing `len` points to roughly `target`.
///
/// Index `floor(i * len / target)` is taken for `i = 0, 1, ..` while in
/// bounds, then the last index is appended if it wasn't already selected.
/// A `target` of zero, or one that is not below `len`, keeps every index.
pub fn downsample_indices(len: usize, target: usize) -> Vec<usize> {
    if target == 0 || len <= target {
        return (0..len).collect();
    }

    let mut indices: Vec<usize> = (0_usize..)
        .map(|i| i.saturating_mul(len) / target)
        .take_while(|idx| *idx < len)
        .collect();

    let last = len - 1;
    if indices.last() != Some(&last) {
        indices.push(last);
    }
    indices
}

/// Reduce a series for display, always keeping the final point
pub fn downsample<T: Clone>(series: &[T], target: usize) -> Vec<T> {
    downsample_indices(series.len(), target)
        .into_iter()
        .map(|i| series[i].clone())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_series_is_unchanged() {
        assert_eq!(downsample_indices(5, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(downsample_indices(3, 10), vec![0, 1, 2]);
        assert_eq!(downsample_indices(4, 0), vec![0, 1, 2, 3]);
        assert!(downsample_indices(0, 3).is_empty());
    }

    #[test]
    fn fractional_stride() {
        // step = 2.5
        assert_eq!(downsample_indices(10, 4), vec![0, 2, 5, 7, 9]);
        // step = 2, the walk ends on 8 so 9 is forced in
        assert_eq!(downsample_indices(10, 5), vec![0, 2, 4, 6, 8, 9]);
        // step = 10
        assert_eq!(downsample_indices(10, 1), vec![0, 9]);
        // step = 1.5, last selected index is 10 -> 11 appended
        assert_eq!(
            downsample_indices(12, 8),
            vec![0, 1, 3, 4, 6, 7, 9, 10, 11]
        );
    }

    #[test]
    fn endpoint_is_always_kept() {
        let series: Vec<u32> = (0..1000).collect();
        for target in 1..series.len() {
            let ds = downsample(&series, target);
            assert_eq!(ds.last(), series.last(), "target {target}");
            assert!(ds.windows(2).all(|w| w[0] < w[1]), "target {target}");
        }
    }
}
