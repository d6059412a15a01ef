use crate::csv::write_row;
use crate::replay::{LeakCandidate, Overview, Peak, Sample, SitePeak, ThreadPeak};
use std::io::{self, Write};

pub const OVERVIEW_HEADER: [&str; 9] = [
    "records",
    "peak_live_bytes",
    "peak_idx",
    "peak_ts_ns",
    "peak_wall_ns",
    "peak_wall_time",
    "end_live_blocks",
    "end_live_bytes",
    "approx_cross",
];

pub const THREAD_PEAKS_HEADER: [&str; 5] = [
    "tid",
    "peak_live_bytes",
    "peak_idx",
    "peak_ts_ns",
    "peak_wall_time",
];

pub const SITE_PEAKS_HEADER: [&str; 5] = [
    "retaddr",
    "peak_live_bytes",
    "peak_idx",
    "peak_ts_ns",
    "peak_wall_time",
];

pub const LEAKS_HEADER: [&str; 6] = ["ptr", "size", "tid", "ra", "alloc_ts_ns", "alloc_wall_time"];

pub const SERIES_HEADER: [&str; 4] = ["idx", "ts_ns", "wall_time", "cur_live_bytes"];

/// Single-row summary of the replay
pub fn write_overview<W: Write>(w: &mut W, o: &Overview) -> io::Result<()> {
    write_row(w, OVERVIEW_HEADER)?;
    write_row(
        w,
        [
            o.records.to_string(),
            o.peak.bytes.to_string(),
            o.peak.idx().to_string(),
            o.peak.ts_ns().to_string(),
            o.peak.wall_ns().get_raw().to_string(),
            o.peak.wall_time().to_owned(),
            o.end_live_blocks.to_string(),
            o.end_live_bytes.to_string(),
            o.threshold_crossing
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        ],
    )
}

fn peak_fields(key: String, p: &Peak) -> [String; 5] {
    [
        key,
        p.bytes.to_string(),
        p.idx().to_string(),
        p.ts_ns().to_string(),
        p.wall_time().to_owned(),
    ]
}

pub fn write_thread_peaks<W: Write>(w: &mut W, rows: &[ThreadPeak]) -> io::Result<()> {
    write_row(w, THREAD_PEAKS_HEADER)?;
    for t in rows {
        write_row(w, peak_fields(t.tid.to_string(), &t.peak))?;
    }
    Ok(())
}

pub fn write_site_peaks<W: Write>(w: &mut W, rows: &[SitePeak]) -> io::Result<()> {
    write_row(w, SITE_PEAKS_HEADER)?;
    for s in rows {
        write_row(w, peak_fields(s.retaddr.to_string(), &s.peak))?;
    }
    Ok(())
}

pub fn write_leaks<'a, W, I>(w: &mut W, rows: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a LeakCandidate>,
{
    write_row(w, LEAKS_HEADER)?;
    for l in rows {
        write_row(
            w,
            [
                l.ptr.to_string(),
                l.size.to_string(),
                l.tid.to_string(),
                l.retaddr.to_string(),
                l.alloc_ts_ns.to_string(),
                l.alloc_wall_time.clone(),
            ],
        )?;
    }
    Ok(())
}

pub fn write_series<W: Write>(w: &mut W, rows: &[Sample]) -> io::Result<()> {
    write_row(w, SERIES_HEADER)?;
    for s in rows {
        write_row(
            w,
            [
                s.idx.to_string(),
                s.ts_ns.to_string(),
                s.wall_time.clone(),
                s.live_bytes.to_string(),
            ],
        )?;
    }
    Ok(())
}
