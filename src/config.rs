use crate::replay::Replayer;

/// Knobs for a replay and the report produced from it
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AnalysisConfig {
    /// Rows kept in the thread and call-site rankings
    pub top: usize,
    /// Target number of time-series points, zero keeps every sample
    pub downsample: usize,
    /// Global live-byte ceiling to report the first crossing of
    pub approx_mem: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top: 50,
            downsample: 400,
            approx_mem: None,
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    #[must_use]
    pub fn with_downsample(mut self, points: usize) -> Self {
        self.downsample = points;
        self
    }

    /// Set the ceiling in bytes, non-positive values disable it.
    /// Fractional ceilings round up since live bytes are whole.
    #[must_use]
    pub fn with_approx_mem(mut self, bytes: f64) -> Self {
        self.approx_mem = (bytes > 0.0).then(|| bytes.ceil() as u64);
        self
    }

    /// A fresh replayer honoring this configuration
    pub fn replayer(&self) -> Replayer {
        Replayer::new().with_ceiling(self.approx_mem)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn approx_mem_conversion() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.top, 50);
        assert_eq!(cfg.downsample, 400);
        assert_eq!(cfg.approx_mem, None);

        assert_eq!(cfg.with_approx_mem(0.0).approx_mem, None);
        assert_eq!(cfg.with_approx_mem(-3.0).approx_mem, None);
        assert_eq!(cfg.with_approx_mem(1024.0).approx_mem, Some(1024));
        assert_eq!(cfg.with_approx_mem(1024.5).approx_mem, Some(1025));
        assert_eq!(cfg.with_approx_mem(0.25).approx_mem, Some(1));
    }
}
