use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::format::format_clock;
use crate::tracker::Records;

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    name: &'a str,
    seconds: u64,
    formatted: String,
}

impl<'a> RecordRow<'a> {
    fn new(name: &'a str, seconds: u64) -> Self {
        Self {
            name,
            seconds,
            formatted: format_clock(seconds),
        }
    }
}

/// Write one CSV row per record, then a `TOTAL` row when the session has started.
pub fn write_records<W: io::Write>(
    writer: W,
    records: &Records,
    session_secs: Option<u64>,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() && session_secs.is_none() {
        wtr.write_record(["name", "seconds", "formatted"])?;
    }
    for (name, secs) in records.iter() {
        wtr.serialize(RecordRow::new(name, secs))?;
    }
    if let Some(total) = session_secs {
        wtr.serialize(RecordRow::new("TOTAL", total))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_records(
    path: &Path,
    records: &Records,
    session_secs: Option<u64>,
) -> Result<(), csv::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_records(file, records, session_secs)
}
