//! Columnar-to-row mapping.
//!
//! Turns a header row plus positional value rows into named-field records.

use std::collections::HashMap;

use crate::error::{AthenaError, Result};
use crate::query::Record;
use crate::service::RawRow;

/// Maps raw rows to records, using the first row as the header.
///
/// NULL cells and cells missing from short rows become `""`. Cells beyond
/// the header width are dropped. A repeated column name keeps its first
/// position and takes the value of its last occurrence.
///
/// Fails with [`AthenaError::EmptyResultSet`] when there is no header row.
pub fn map_rows(rows: &[RawRow]) -> Result<Vec<Record>> {
    let (header, data) = rows.split_first().ok_or(AthenaError::EmptyResultSet)?;
    let columns = resolve_columns(header);

    let records = data
        .iter()
        .map(|row| {
            let mut record = Record::with_capacity(columns.len());
            for &(name, source) in &columns {
                let value = row
                    .get(source)
                    .and_then(|cell| cell.as_deref())
                    .unwrap_or("");
                record.push(name, value);
            }
            record
        })
        .collect();

    Ok(records)
}

/// Resolves the header into one `(name, source index)` slot per distinct
/// name, in first-occurrence order, each pointing at the last occurrence.
fn resolve_columns(header: &[Option<String>]) -> Vec<(&str, usize)> {
    let mut slots: Vec<(&str, usize)> = Vec::with_capacity(header.len());
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(header.len());

    for (source, cell) in header.iter().enumerate() {
        let name = cell.as_deref().unwrap_or_default();
        match seen.get(name) {
            Some(&slot) => slots[slot].1 = source,
            None => {
                seen.insert(name, slots.len());
                slots.push((name, source));
            }
        }
    }
    slots
}
