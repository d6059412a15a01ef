use chrono::{Local, TimeZone};
use derive_more::{Add, AddAssign, Binary, Display, From, Into, LowerHex, Octal, Sum, UpperHex};
use std::fmt;

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Logical timestamp in nanoseconds, taken from the monotonic clock of the
/// traced process.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    Display,
    From,
    Into,
    Binary,
    Octal,
    LowerHex,
    UpperHex,
    Add,
    Sum,
    AddAssign,
)]
#[display(fmt = "{_0}")]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn get_raw(&self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is not earlier
    pub fn span_since(&self, earlier: Timestamp) -> Span {
        Span(self.0.saturating_sub(earlier.0))
    }

    /// Render relative to `base` as `t+SSS.mmm`
    pub fn relative_to(&self, base: Timestamp) -> RelativeTime {
        RelativeTime { ts: *self, base }
    }
}

/// Wall-clock time in nanoseconds since the Unix epoch.
/// A value of zero means the recorder did not capture wall-clock time
/// (i.e. v1 binary records).
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From, Into, LowerHex, UpperHex,
)]
pub struct WallClock(pub u64);

impl WallClock {
    pub const UNAVAILABLE: &'static str = "-";

    pub fn get_raw(&self) -> u64 {
        self.0
    }

    pub fn is_available(&self) -> bool {
        self.0 != 0
    }
}

/// Local time with millisecond precision, `YYYY-MM-DD HH:MM:SS.mmm`
impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_available() {
            return f.write_str(Self::UNAVAILABLE);
        }
        let secs = (self.0 / NANOS_PER_SEC) as i64;
        let millis = (self.0 % NANOS_PER_SEC) / NANOS_PER_MILLI;
        match Local.timestamp_opt(secs, 0).earliest() {
            Some(dt) => write!(f, "{}.{millis:03}", dt.format("%Y-%m-%d %H:%M:%S")),
            None => f.write_str(Self::UNAVAILABLE),
        }
    }
}

/// A duration in nanoseconds, rendered as `HH:MM:SS.mmm`
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, From, Into, Add, AddAssign,
)]
pub struct Span(pub u64);

impl Span {
    pub fn as_nanos(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.0 / NANOS_PER_MILLI;
        let ms = total_ms % 1000;
        let total_s = total_ms / 1000;
        let s = total_s % 60;
        let m = (total_s / 60) % 60;
        let h = total_s / 3600;
        write!(f, "{h:02}:{m:02}:{s:02}.{ms:03}")
    }
}

/// A timestamp displayed relative to the start of the trace, `t+SSS.mmm`.
/// When there is no usable base (zero, or later than the timestamp) the raw
/// timestamp is shown instead.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RelativeTime {
    ts: Timestamp,
    base: Timestamp,
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rel = if self.base.0 != 0 && self.ts >= self.base {
            self.ts.0 - self.base.0
        } else {
            self.ts.0
        };
        let sec = rel / NANOS_PER_SEC;
        let ms = (rel % NANOS_PER_SEC) / NANOS_PER_MILLI;
        write!(f, "t+{sec}.{ms:03}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn span_formatting() {
        assert_eq!(Span(0).to_string(), "00:00:00.000");
        assert_eq!(Span(1_500_000).to_string(), "00:00:00.001");
        let ns = ((2 * 3600 + 3 * 60 + 4) * 1000 + 567) * NANOS_PER_MILLI;
        assert_eq!(Span(ns).to_string(), "02:03:04.567");
        assert_eq!(
            Timestamp(5 * NANOS_PER_SEC).span_since(Timestamp(7)),
            Span(5 * NANOS_PER_SEC - 7)
        );
        assert_eq!(Timestamp(1).span_since(Timestamp(7)), Span(0));
    }

    #[test]
    fn relative_time() {
        let base = Timestamp(10 * NANOS_PER_SEC);
        let ts = Timestamp(12 * NANOS_PER_SEC + 34 * NANOS_PER_MILLI);
        assert_eq!(ts.relative_to(base).to_string(), "t+2.034");

        // No base, or base ahead of the timestamp, shows the raw value
        assert_eq!(ts.relative_to(Timestamp::zero()).to_string(), "t+12.034");
        assert_eq!(base.relative_to(ts).to_string(), "t+10.000");
    }

    #[test]
    fn unavailable_wall_clock() {
        assert_eq!(WallClock(0).to_string(), "-");
        assert!(!WallClock::default().is_available());
    }

    #[test]
    fn wall_clock_millis() {
        // Local offset varies, only the fixed-width shape and millis are stable
        let s = WallClock(1_700_000_000 * NANOS_PER_SEC + 42 * NANOS_PER_MILLI).to_string();
        assert_eq!(s.len(), "YYYY-MM-DD HH:MM:SS.mmm".len());
        assert!(s.ends_with(".042"));
    }
}
