//! CSV output.
//!
//! Files are written to a temporary file next to the destination and
//! persisted only once fully written, so a failed run never leaves a partial
//! output behind.

use crate::compression::Compression;
use crate::record::RecordSet;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `table` to `path`, compressing by extension
pub fn write_table(path: &Path, table: &RecordSet) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| anyhow::anyhow!("cannot create temp file in {}: {}", dir.display(), e))?;

    {
        let mut encoder = Compression::from_path(path).wrap_writer(BufWriter::new(&mut tmp))?;
        write_table_to(&mut encoder, table)?;
        encoder
            .finish()?
            .into_inner()
            .map_err(|e| e.into_error())?;
    }

    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("cannot write {}: {}", path.display(), e.error))?;
    Ok(())
}

/// Write `table` as CSV text: header row, then every record in order
pub fn write_table_to<W: Write>(writer: W, table: &RecordSet) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(table.columns().names())?;
    for record in table.rows() {
        csv.write_record(record.values().iter().map(|v| v.to_csv_field()))?;
    }
    csv.flush()?;
    Ok(())
}

/// Render `table` as CSV bytes
pub fn table_to_bytes(table: &RecordSet) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    write_table_to(&mut out, table)?;
    Ok(out)
}
