//! Batch files: one process per line under a
//! `Process  Arrival  CPU Burst Time  Priority` header.
//!
//! Columns are separated by tabs or by runs of two or more spaces; a header
//! containing commas switches to comma separated rows. The `Priority` column
//! is optional.
use std::fs;
use std::io;
use std::path::Path;

use csv::StringRecord;

use crate::types::ProcessSpec;
use crate::utils::prelude::*;

pub fn read_batch(path: &Path) -> Result<Vec<ProcessSpec>> {
    let text = fs::read_to_string(path)?;
    let specs = parse_batch(&text)?;
    info!(path = %path.display(), processes = specs.len(), "read batch");
    Ok(specs)
}

pub fn parse_batch(text: &str) -> Result<Vec<ProcessSpec>> {
    // line numbers are 1-based and count blank lines
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let header = match lines.next() {
        Some((_, header)) => header,
        None => return Ok(vec![]),
    };
    let commas = header.contains(',');
    let headers = StringRecord::from(columns(header, commas));

    lines
        .map(|(line, row)| {
            StringRecord::from(columns(row, commas))
                .deserialize::<ProcessSpec>(Some(&headers))
                .map_err(|source| Error::BatchRow { line, source })
        })
        .collect()
}

fn columns(line: &str, commas: bool) -> Vec<&str> {
    if commas {
        line.split(',').map(str::trim).collect()
    } else {
        // single spaces stay inside a field, as in `CPU Burst Time`
        line.split('\t')
            .flat_map(|f| f.split("  "))
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect()
    }
}

/// Write a batch in the tab separated layout `parse_batch` reads
pub fn write_batch(writer: impl io::Write, specs: &[ProcessSpec]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    for spec in specs {
        writer.serialize(spec)?;
    }
    writer.flush()?;
    Ok(())
}
