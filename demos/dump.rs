use clap::Parser;
use memhook_replay::csv::EventWriter;
use memhook_replay::raw::{DumpSummary, RecordFormat, RecordReader};
use memhook_replay::replay::{LeakOrder, Replayer};
use memhook_replay::time::Timestamp;
use memhook_replay::types::{HumanBytes, OpKind};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tabular::{Row, Table};

#[derive(Parser, Debug, Clone)]
#[clap(name = "dump", version, about = "Summarize a binary memhook log and list the blocks never freed", long_about = None)]
pub struct Opts {
    /// Also convert the log to CSV at this path
    #[clap(long)]
    pub csv: Option<PathBuf>,

    /// List every unfreed block
    #[clap(long)]
    pub live_all: bool,

    /// Number of unfreed blocks to list
    #[clap(long, default_value_t = 20)]
    pub live_top: usize,

    /// Ignore unfreed blocks smaller than this many bytes
    #[clap(long, default_value_t = 0, value_parser=clap_num::maybe_hex::<u64>)]
    pub min_size: u64,

    /// List the oldest blocks first instead of the largest
    #[clap(long)]
    pub time_asc: bool,

    /// Path to the binary log
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

    let f = File::open(&opts.path)?;
    let len = f.metadata()?.len();
    let format = RecordFormat::detect(len);
    let mut rd = RecordReader::new(BufReader::new(f), format);

    let mut csv = match &opts.csv {
        Some(p) => Some(EventWriter::new(BufWriter::new(File::create(p)?))?),
        None => None,
    };

    let mut summary = DumpSummary::new();
    let mut replayer = Replayer::new();
    while let Some(event) = rd.read_event()? {
        if let Some(w) = csv.as_mut() {
            w.write_event(&event)?;
        }
        summary.observe(&event, replayer.live());
        replayer.apply(&event);
    }
    if let Some(w) = csv.as_mut() {
        w.flush()?;
    }

    let order = if opts.time_asc {
        LeakOrder::TimeAsc
    } else {
        LeakOrder::SizeDesc
    };
    let analysis = replayer.finish();
    let leaks = analysis.leak_report(order, opts.min_size);

    eprintln!("== summary ==");
    eprintln!(
        "records={} size={len}B format={format}",
        format.record_count(len)
    );
    eprintln!(
        "counts: malloc={} free={} realloc={} calloc={} unknown={}",
        summary.count(OpKind::Malloc),
        summary.count(OpKind::Free),
        summary.count(OpKind::Realloc),
        summary.count(OpKind::Calloc),
        summary.unknown_ops,
    );
    eprintln!(
        "total malloc={} calloc={} realloc(new)={} freed={}",
        HumanBytes(summary.total_malloc),
        HumanBytes(summary.total_calloc),
        HumanBytes(summary.total_realloc),
        HumanBytes(summary.total_freed),
    );
    eprintln!(
        "live={} in {} blocks  (min-size filter: >= {}B)",
        HumanBytes(leaks.bytes),
        leaks.blocks.len(),
        leaks.min_size
    );
    eprintln!("span={}", summary.span());
    eprintln!("order={order}");

    if leaks.blocks.is_empty() {
        eprintln!("\n== leaks (unfreed blocks) ==");
        eprintln!("<none matched the current min-size filter>");
        return Ok(());
    }

    let limit = if opts.live_all {
        leaks.blocks.len()
    } else {
        opts.live_top.min(leaks.blocks.len())
    };
    let start = summary.first_ts.unwrap_or_else(Timestamp::zero);

    eprintln!(
        "\n== leaks (unfreed blocks) {}, order={order} ==",
        if opts.live_all { "[ALL]" } else { "[TOP]" }
    );
    let mut table = Table::new("{:>}  {:>}  {:<}  {:>}  {:<}  {:>}  {:<}");
    for (i, l) in leaks.blocks.iter().take(limit).enumerate() {
        table.add_row(
            Row::new()
                .with_cell(format!("{})", i + 1))
                .with_cell(HumanBytes(l.size))
                .with_cell(l.ptr)
                .with_cell(format!("tid={}", l.tid))
                .with_cell(format!("ra={}", l.retaddr))
                .with_cell(l.alloc_ts_ns.relative_to(start))
                .with_cell(format!("wall={}", l.alloc_wall_ns)),
        );
    }
    eprint!("{table}");
    if !opts.live_all && leaks.blocks.len() > limit {
        eprintln!(
            "... ({} more, use --live-all to show all)",
            leaks.blocks.len() - limit
        );
    }
    eprintln!("\nHint: addr2line -e <elf> 0xRETADDR   # map ra to source:line");

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
