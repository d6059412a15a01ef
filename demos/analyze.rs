use clap::Parser;
use memhook_replay::csv::TraceReader;
use memhook_replay::report::ReportWriter;
use memhook_replay::AnalysisConfig;
use std::{fs::File, io::BufReader, path::PathBuf};
use tracing::warn;

#[derive(Parser, Debug, Clone)]
#[clap(name = "analyze", version, about = "Replay a memhook CSV log and write peak and leak reports", long_about = None)]
pub struct Opts {
    /// Output directory for the report tables
    #[clap(long, default_value = "out_report")]
    pub out: PathBuf,

    /// Target number of time-series points, 0 keeps every sample
    #[clap(long, default_value_t = 400)]
    pub downsample: usize,

    /// Number of threads and call-sites kept in the rankings
    #[clap(long, default_value_t = 50)]
    pub top: usize,

    /// Report the first event at which live bytes reach this many bytes, 0 disables
    #[clap(long, default_value_t = 0.0)]
    pub approx_mem: f64,

    /// Path to the CSV log
    #[clap(value_parser)]
    pub path: PathBuf,
}

fn main() {
    match do_main() {
        Ok(()) => (),
        Err(e) => {
            eprintln!("{e}");
            let mut cause = e.source();
            while let Some(err) = cause {
                eprintln!("Caused by: {err}");
                cause = err.source();
            }
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn do_main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();

    reset_signal_pipe_handler()?;

    tracing_subscriber::fmt::init();

    let config = AnalysisConfig::default()
        .with_top(opts.top)
        .with_downsample(opts.downsample)
        .with_approx_mem(opts.approx_mem);

    let f = File::open(&opts.path)?;
    let mut rd = TraceReader::new(BufReader::new(f))?;

    let mut replayer = config.replayer();
    while let Some(event) = rd.read_event()? {
        replayer.apply(&event);
    }
    if rd.dropped_rows() != 0 {
        warn!(rows = rd.dropped_rows(), "Skipped malformed rows");
    }

    let analysis = replayer.finish();
    let paths = ReportWriter::create(&opts.out)?.write(&analysis, &config)?;

    let ov = &analysis.overview;
    println!("[ok] overview -> {}", paths.overview.display());
    println!(
        "     peak_live_bytes={} at {} (idx={})",
        ov.peak.bytes,
        ov.peak.wall_time(),
        ov.peak.idx()
    );
    if let Some(c) = &ov.threshold_crossing {
        println!(
            "     crossed approx-mem at {} (bytes={}, idx={})",
            c.at.wall_time, c.live_bytes, c.at.idx
        );
    }
    println!(
        "[ok] top tids -> {} (TOP {})",
        paths.threads.display(),
        paths.thread_rows
    );
    println!(
        "[ok] top sites -> {} (TOP {})",
        paths.sites.display(),
        paths.site_rows
    );
    println!(
        "[ok] live-at-end blocks -> {} (n={})",
        paths.leaks.display(),
        paths.leak_rows
    );
    println!(
        "[ok] time series (downsampled) -> {} (points={}/{})",
        paths.series.display(),
        paths.series_points,
        paths.series_total
    );

    Ok(())
}

// Used to prevent panics on broken pipes.
// See:
//   https://github.com/rust-lang/rust/issues/46016#issuecomment-605624865
fn reset_signal_pipe_handler() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(target_family = "unix")]
    {
        use nix::sys::signal;

        unsafe {
            signal::signal(signal::Signal::SIGPIPE, signal::SigHandler::SigDfl)?;
        }
    }

    Ok(())
}
