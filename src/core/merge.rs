//! Fan-in: remote rows, one target each, back into logical records.

use crate::core::record::{HostOverride, LogicalRecord};
use std::collections::HashMap;
use tracing::warn;

/// Converts a single remote row into a one-target logical record.
///
/// Unsupported record types keep their shape but carry no target.
pub fn to_logical_record(row: &HostOverride) -> LogicalRecord {
    let ttl = if row.ttl.is_empty() {
        0
    } else {
        row.ttl.parse::<i64>().unwrap_or_else(|e| {
            warn!(
                "Invalid TTL {:?} on {}, using 0: {}",
                row.ttl,
                row.fqdn(),
                e
            );
            0
        })
    };

    let mut record = LogicalRecord::new(row.fqdn(), row.record_type(), Vec::new());
    record.ttl = ttl;
    record.owner = row.description.clone();
    if let Some(value) = row.value() {
        record.targets.push(value.to_string());
        if let Some(id) = &row.id {
            record.identity.insert(value, id.as_str());
        }
    }
    record
}

/// Collapses remote rows into one logical record per `(name, type)`.
pub fn merge(rows: &[HostOverride]) -> Vec<LogicalRecord> {
    let records: Vec<LogicalRecord> = rows.iter().map(to_logical_record).collect();
    merge_records(&records)
}

/// Groups records by `(name, type)` in first-seen order. Targets and identity
/// fragments are unioned without duplicates; TTL and owner come from the first
/// record of each group. The input is left untouched.
pub fn merge_records(records: &[LogicalRecord]) -> Vec<LogicalRecord> {
    let mut merged: Vec<LogicalRecord> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let key = (record.name.clone(), record.record_type.to_string());
        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged[i];
                for target in &record.targets {
                    existing.add_target(target);
                }
                existing.identity.extend(&record.identity);
            }
            None => {
                let mut first = record.clone();
                first.targets = Vec::new();
                for target in &record.targets {
                    first.add_target(target);
                }
                index.insert(key, merged.len());
                merged.push(first);
            }
        }
    }

    merged
}
