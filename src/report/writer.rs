use crate::config::AnalysisConfig;
use crate::replay::Analysis;
use crate::report::{
    write_leaks, write_overview, write_series, write_site_peaks, write_thread_peaks, Error,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where each table went and how many rows it holds
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ReportPaths {
    pub overview: PathBuf,
    pub threads: PathBuf,
    pub thread_rows: usize,
    pub sites: PathBuf,
    pub site_rows: usize,
    pub leaks: PathBuf,
    pub leak_rows: usize,
    pub series: PathBuf,
    pub series_points: usize,
    pub series_total: usize,
}

/// Writes the report tables of an [`Analysis`] into a directory
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    pub const OVERVIEW: &'static str = "overview.csv";
    pub const TOP_TIDS: &'static str = "top_tids_by_peak.csv";
    pub const TOP_SITES: &'static str = "top_sites_by_peak.csv";
    pub const LIVE_AT_END: &'static str = "live_blocks_at_end.csv";
    pub const TIMESERIES: &'static str = "timeseries_downsampled.csv";

    /// Use `out_dir`, creating it if needed
    pub fn create<P: AsRef<Path>>(out_dir: P) -> Result<Self, Error> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir).map_err(|e| Error::OutputDir(out_dir.clone(), e))?;
        Ok(Self { out_dir })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn write(&self, analysis: &Analysis, config: &AnalysisConfig) -> Result<ReportPaths, Error> {
        let overview = self.table(Self::OVERVIEW, |w| write_overview(w, &analysis.overview))?;

        let top_threads = analysis.top_threads(config.top);
        let threads = self.table(Self::TOP_TIDS, |w| write_thread_peaks(w, top_threads))?;

        let top_sites = analysis.top_sites(config.top);
        let sites = self.table(Self::TOP_SITES, |w| write_site_peaks(w, top_sites))?;

        let leaks = self.table(Self::LIVE_AT_END, |w| write_leaks(w, &analysis.leaks))?;

        let samples = analysis.downsampled_series(config.downsample);
        let series = self.table(Self::TIMESERIES, |w| write_series(w, &samples))?;

        Ok(ReportPaths {
            overview,
            threads,
            thread_rows: top_threads.len(),
            sites,
            site_rows: top_sites.len(),
            leaks,
            leak_rows: analysis.leaks.len(),
            series,
            series_points: samples.len(),
            series_total: analysis.series.len(),
        })
    }

    fn table<F>(&self, name: &str, f: F) -> Result<PathBuf, Error>
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        let path = self.out_dir.join(name);
        debug!(path = %path.display(), "Writing report table");
        let res = File::create(&path).and_then(|file| {
            let mut w = BufWriter::new(file);
            f(&mut w)?;
            w.flush()
        });
        res.map_err(|e| Error::Write(path.clone(), e))?;
        Ok(path)
    }
}
