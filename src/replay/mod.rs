pub use analysis::{
    Analysis, LeakCandidate, LeakOrder, LeakReport, Overview, Peak, SitePeak, ThreadPeak,
    ThresholdCrossing,
};
pub use counter::{CounterFamily, PeakCounter};
pub use engine::{analyze, Replayer};
pub use live::{LiveAllocation, LiveIndex};
pub use series::{downsample, downsample_indices, Sample};

pub mod analysis;
pub mod counter;
pub mod engine;
pub mod live;
pub mod series;
