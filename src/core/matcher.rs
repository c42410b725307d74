//! Resolves which existing override stands for one target of a logical record.

use crate::core::record::{HostOverride, LogicalRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match<'a> {
    Resolved(&'a HostOverride),
    /// Nothing remote carries this target.
    Unresolved,
    /// Several overrides carry this target and ownership does not single one out.
    /// Holds the ids of the conflicting overrides.
    Ambiguous(Vec<String>),
}

/// Finds the override for `target` among `candidates`.
///
/// Candidates outside the record's `(host, domain, type)` key are ignored. A
/// carried identity wins when its id is among the candidates; several carried
/// ids for one target are ambiguous. Otherwise the target is compared with each
/// candidate's value field. Several value matches are narrowed to the one whose
/// description equals `owner`.
pub fn find_entity<'a>(
    record: &LogicalRecord,
    target: &str,
    owner: &str,
    candidates: &'a [HostOverride],
) -> Match<'a> {
    match carried_entities(record, target, candidates).as_slice() {
        [] => {}
        [only] => return Match::Resolved(*only),
        several => return Match::Ambiguous(ids_of(several)),
    }

    let by_value: Vec<&HostOverride> = in_key(record, candidates)
        .into_iter()
        .filter(|c| c.value() == Some(target))
        .collect();

    match by_value.as_slice() {
        [] => Match::Unresolved,
        [only] => Match::Resolved(*only),
        several => {
            let owned: Vec<&HostOverride> = several
                .iter()
                .copied()
                .filter(|c| c.description == owner)
                .collect();
            if let [only] = owned.as_slice() {
                Match::Resolved(*only)
            } else {
                Match::Ambiguous(ids_of(several))
            }
        }
    }
}

/// Candidates in the record's key whose id the record carries for `target`.
pub fn carried_entities<'a>(
    record: &LogicalRecord,
    target: &str,
    candidates: &'a [HostOverride],
) -> Vec<&'a HostOverride> {
    let ids = record.identity.ids(target);
    if ids.is_empty() {
        return Vec::new();
    }
    in_key(record, candidates)
        .into_iter()
        .filter(|c| c.id.as_deref().is_some_and(|id| ids.contains(&id)))
        .collect()
}

fn in_key<'a>(record: &LogicalRecord, candidates: &'a [HostOverride]) -> Vec<&'a HostOverride> {
    let Ok((host, domain)) = record.split_name() else {
        return Vec::new();
    };
    candidates
        .iter()
        .filter(|c| c.has_key(&host, &domain, &record.record_type))
        .collect()
}

fn ids_of(entities: &[&HostOverride]) -> Vec<String> {
    entities
        .iter()
        .map(|c| c.id.clone().unwrap_or_default())
        .collect()
}
