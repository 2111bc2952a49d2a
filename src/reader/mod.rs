//! CSV input.
//!
//! Required columns (`ID`, `Created`, `Modified`) are parsed strictly and a
//! bad cell aborts the read with its line number. Columns the field table
//! types are parsed as that type, falling back to inference for cells that
//! do not fit. Everything else is inferred per cell.

use crate::compression::Compression;
use crate::fields::FieldTable;
use crate::record::{ColumnType, RecordSet, Value, CREATED, DAY, HOUR, ID, IS_DELETED, MODIFIED};
use ahash::AHashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read a (possibly compressed) CSV file into a record set
pub fn read_table(path: &Path, fields: &FieldTable) -> anyhow::Result<RecordSet> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", path.display(), e))?;
    let compression = Compression::from_path(path);
    let reader = compression.wrap_reader(Box::new(BufReader::new(file)))?;
    read_table_from(reader, fields).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}

/// Read CSV text from any reader
pub fn read_table_from<R: Read>(reader: R, fields: &FieldTable) -> anyhow::Result<RecordSet> {
    let mut csv = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers: Vec<String> = csv.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let types: Vec<(ColumnType, bool)> = headers
        .iter()
        .map(|name| column_type(name, fields))
        .collect();

    let mut table = RecordSet::new(headers.clone())?;
    let id_column = table.lifecycle().id;
    let mut seen_ids = AHashSet::new();

    for (i, result) in csv.records().enumerate() {
        // Header is line 1
        let line = i + 2;
        let record = result.map_err(|e| anyhow::anyhow!("line {}: {}", line, e))?;

        let mut values = Vec::with_capacity(headers.len());
        for ((raw, &(ty, strict)), name) in record.iter().zip(&types).zip(&headers) {
            values.push(parse_cell(raw, ty, strict, name, line)?);
        }

        if let Some(id) = values[id_column].as_int() {
            if id < 0 {
                anyhow::bail!("line {}: negative ID {}", line, id);
            }
            if !seen_ids.insert(id) {
                anyhow::bail!("line {}: duplicate ID {}", line, id);
            }
        }
        table.push_source_row(values)?;
    }

    Ok(table)
}

/// Column type and whether a parse failure is fatal
fn column_type(name: &str, fields: &FieldTable) -> (ColumnType, bool) {
    match name {
        ID => (ColumnType::Int, true),
        CREATED | MODIFIED => (ColumnType::Timestamp, true),
        IS_DELETED => (ColumnType::Bool, true),
        DAY => (ColumnType::Date, false),
        HOUR => (ColumnType::Int, false),
        _ => (
            fields.column_type(name).unwrap_or(ColumnType::Inferred),
            false,
        ),
    }
}

fn parse_cell(
    raw: &str,
    ty: ColumnType,
    strict: bool,
    name: &str,
    line: usize,
) -> anyhow::Result<Value> {
    if strict && raw.trim().is_empty() && name != IS_DELETED {
        anyhow::bail!("line {}: column '{}' is empty", line, name);
    }
    match Value::parse(raw, ty) {
        Ok(value) => Ok(value),
        Err(e) if strict => anyhow::bail!("line {}: column '{}': {}", line, name, e),
        Err(_) => Ok(Value::infer(raw)),
    }
}
