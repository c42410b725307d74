//! Entry point for one read or one change batch.
//!
//! A batch runs deletes, then creates, then updates, each group in input order and
//! strictly one record after another. Deleting first frees `(name, type)` keys a
//! replacement record is about to reuse. Once every record has been attempted the
//! remote resolver is reconfigured a single time; nothing is rolled back.

use crate::core::merge::merge;
use crate::core::provider::OverrideClient;
use crate::core::record::{DomainFilter, LogicalRecord};
use crate::core::sync::EntrySynchronizer;
use crate::error::Error;
use std::sync::Arc;
use tracing::{error, info};

/// Desired-state diff from the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub create: Vec<LogicalRecord>,
    pub update_new: Vec<LogicalRecord>,
    pub delete: Vec<LogicalRecord>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update_new.is_empty() && self.delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.create.len() + self.update_new.len() + self.delete.len()
    }
}

pub struct Reconciler {
    client: Arc<dyn OverrideClient>,
    sync: EntrySynchronizer,
    domain_filter: DomainFilter,
    apply_changes: bool,
}

impl Reconciler {
    pub fn new(
        client: Arc<dyn OverrideClient>,
        owner: impl Into<String>,
        domain_filter: DomainFilter,
        apply_changes: bool,
    ) -> Self {
        Self {
            sync: EntrySynchronizer::new(client.clone(), owner),
            client,
            domain_filter,
            apply_changes,
        }
    }

    pub fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    /// Current remote state, merged into logical records within the domain filter.
    pub async fn records(&self) -> Result<Vec<LogicalRecord>, Error> {
        let rows = self.client.search("").await.map_err(|e| {
            error!("Error retrieving host overrides: {}", e);
            e
        })?;
        let records: Vec<LogicalRecord> = merge(&rows)
            .into_iter()
            .filter(|r| self.domain_filter.matches(&r.name))
            .collect();
        info!(
            "Retrieved {} override(s) as {} record(s)",
            rows.len(),
            records.len()
        );
        Ok(records)
    }

    /// Applies a batch. One record's failure never stops the others; every
    /// failure is returned together as [`Error::Batch`].
    pub async fn apply(&self, changes: &ChangeSet) -> Result<(), Error> {
        if changes.is_empty() {
            return Ok(());
        }
        info!(
            "Applying {} change(s): {} delete, {} create, {} update",
            changes.len(),
            changes.delete.len(),
            changes.create.len(),
            changes.update_new.len()
        );

        let mut errors = Vec::new();
        for record in &changes.delete {
            if let Err(e) = self.sync.delete(record).await {
                error!("Error deleting entry {}: {}", record.name, e);
                errors.push(e);
            }
        }
        for record in &changes.create {
            if let Err(e) = self.sync.create(record).await {
                error!("Error creating entry {}: {}", record.name, e);
                errors.push(e);
            }
        }
        for record in &changes.update_new {
            if let Err(e) = self.sync.update(record).await {
                error!("Error updating entry {}: {}", record.name, e);
                errors.push(e);
            }
        }

        if self.apply_changes {
            match self.client.reconfigure().await {
                Ok(()) => info!("Remote changes applied"),
                Err(e) => {
                    error!("Error applying changes: {}", e);
                    errors.push(e);
                }
            }
        }

        match errors.len() {
            0 => Ok(()),
            _ => Err(Error::Batch(errors)),
        }
    }
}
