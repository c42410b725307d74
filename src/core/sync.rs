//! Fan-out: one logical record into one remote call per target.

use crate::core::matcher::{Match, carried_entities, find_entity};
use crate::core::provider::OverrideClient;
use crate::core::record::{HostOverride, LogicalRecord};
use crate::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct EntrySynchronizer {
    client: Arc<dyn OverrideClient>,
    owner: String,
}

impl EntrySynchronizer {
    pub fn new(client: Arc<dyn OverrideClient>, owner: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
        }
    }

    /// Creates one override per target. Stops at the first failing target.
    pub async fn create(&self, record: &LogicalRecord) -> Result<Vec<String>, Error> {
        let (host, domain) = validate(record, true)?;
        info!(
            "Creating entry: [{}] {} {:?}",
            record.record_type, record.name, record.targets
        );

        let mut ids = Vec::new();
        for target in unique_targets(record) {
            let entity = self.build_override(record, &host, &domain, target, None);
            debug!("Creating host override: {:?}", entity);
            let id = self.client.create(&entity).await.map_err(|e| {
                error!(
                    "Error creating host override for {} => {}: {}",
                    record.name, target, e
                );
                e
            })?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Rewrites the override behind each target. Targets nothing remote carries
    /// are skipped; failures are collected and the remaining targets still run.
    pub async fn update(&self, record: &LogicalRecord) -> Result<(), Error> {
        let (host, domain) = validate(record, true)?;
        info!(
            "Updating entry: [{}] {} {:?}",
            record.record_type, record.name, record.targets
        );
        let candidates = self.find_overrides(record, &host, &domain).await?;

        let mut errors = Vec::new();
        for target in unique_targets(record) {
            let ids = self
                .resolve_ids(record, &host, &domain, target, &candidates, false, &mut errors)
                .await;
            let Some(id) = ids.into_iter().next() else {
                continue;
            };
            let entity = self.build_override(record, &host, &domain, target, Some(id.clone()));
            info!(
                "Using UUID {} for [{}] {} => {}",
                id, record.record_type, record.name, target
            );
            if let Err(e) = self.client.update(&id, &entity).await {
                error!("Error updating host override {}: {}", id, e);
                errors.push(e);
            }
        }
        Error::from_many(errors)
    }

    /// Deletes the overrides behind each target, including every id the record
    /// carries for it. Targets nothing remote carries are skipped.
    pub async fn delete(&self, record: &LogicalRecord) -> Result<(), Error> {
        let (host, domain) = validate(record, false)?;
        info!(
            "Deleting entry: [{}] {} {:?}",
            record.record_type, record.name, record.targets
        );
        let candidates = self.find_overrides(record, &host, &domain).await?;

        let mut errors = Vec::new();
        for target in unique_targets(record) {
            let ids = self
                .resolve_ids(record, &host, &domain, target, &candidates, true, &mut errors)
                .await;
            for id in ids {
                info!(
                    "Deleting host override {} for [{}] {} => {}",
                    id, record.record_type, record.name, target
                );
                if let Err(e) = self.client.delete(&id).await {
                    error!("Error deleting host override {}: {}", id, e);
                    errors.push(e);
                }
            }
        }
        Error::from_many(errors)
    }

    /// Owner-scoped search, narrowed to the record's exact key.
    async fn find_overrides(
        &self,
        record: &LogicalRecord,
        host: &str,
        domain: &str,
    ) -> Result<Vec<HostOverride>, Error> {
        let phrase = format!(
            "{} {} {} {}",
            host,
            domain.replace('.', " "),
            self.owner,
            record.record_type
        );
        debug!(
            "Searching overrides for {} with phrase '{}' ({} known id(s))",
            record.name,
            phrase,
            record.identity.len()
        );
        let rows = self.client.search(&phrase).await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.has_key(host, domain, &record.record_type))
            .collect())
    }

    /// Ids of the overrides that hold `target`; empty when there is nothing to
    /// touch. With `several` unset more than one id is an ambiguity. Ambiguity
    /// and lookup failures land in `errors`.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_ids(
        &self,
        record: &LogicalRecord,
        host: &str,
        domain: &str,
        target: &str,
        candidates: &[HostOverride],
        several: bool,
        errors: &mut Vec<Error>,
    ) -> Vec<String> {
        if several {
            let carried = carried_entities(record, target, candidates);
            if carried.len() > 1 {
                return carried.iter().filter_map(|e| e.id.clone()).collect();
            }
        }

        match find_entity(record, target, &self.owner, candidates) {
            Match::Resolved(entity) => entity.id.iter().cloned().collect(),
            Match::Ambiguous(ids) => {
                errors.push(ambiguous(record, target, &ids));
                Vec::new()
            }
            Match::Unresolved => {
                let carried = record.identity.ids(target);
                if carried.is_empty() {
                    warn!(
                        "No existing override found for target {} of [{}] {}, skipping",
                        target, record.record_type, record.name
                    );
                    return Vec::new();
                }
                // Carried ids the search did not return: ask for them directly.
                let mut confirmed = Vec::new();
                for id in carried {
                    match self.client.get(id).await {
                        Ok(entity) if entity.has_key(host, domain, &record.record_type) => {
                            confirmed.push(id.to_string());
                        }
                        Ok(entity) => {
                            warn!(
                                "Override {} now holds [{}] {}, not {}, skipping",
                                id,
                                entity.record_type,
                                entity.fqdn(),
                                record.name
                            );
                        }
                        Err(Error::NotFound(_)) => {
                            warn!("Override {} for target {} no longer exists, skipping", id, target);
                        }
                        Err(e) => {
                            error!("Error reading override {}: {}", id, e);
                            errors.push(e);
                        }
                    }
                }
                if confirmed.len() > 1 && !several {
                    errors.push(ambiguous(record, target, &confirmed));
                    return Vec::new();
                }
                confirmed
            }
        }
    }

    fn build_override(
        &self,
        record: &LogicalRecord,
        host: &str,
        domain: &str,
        target: &str,
        id: Option<String>,
    ) -> HostOverride {
        let mut entity = HostOverride {
            id,
            host: host.to_string(),
            domain: domain.to_string(),
            record_type: record.record_type.to_string(),
            ttl: record.ttl.to_string(),
            enabled: true,
            description: self.owner.clone(),
            ..Default::default()
        };
        entity.set_value(target);
        entity
    }
}

fn ambiguous(record: &LogicalRecord, target: &str, ids: &[String]) -> Error {
    let err = Error::Ambiguous(format!(
        "overrides {:?} all hold [{}] {} => {}",
        ids, record.record_type, record.name, target
    ));
    error!("{}", err);
    err
}

fn validate(record: &LogicalRecord, require_targets: bool) -> Result<(String, String), Error> {
    let (host, domain) = record.split_name()?;
    if !record.record_type.is_supported() {
        return Err(Error::InvalidInput(format!(
            "record type {} of {} is not supported",
            record.record_type, record.name
        )));
    }
    if require_targets && record.targets.is_empty() {
        return Err(Error::InvalidInput(format!(
            "[{}] {} has no targets",
            record.record_type, record.name
        )));
    }
    Ok((host, domain))
}

fn unique_targets(record: &LogicalRecord) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::with_capacity(record.targets.len());
    for target in &record.targets {
        if !seen.contains(&target.as_str()) {
            seen.push(target);
        }
    }
    seen
}
