//! Provider-neutral record model and the reconciliation engine.

pub mod matcher;
pub mod merge;
pub mod provider;
pub mod reconcile;
pub mod record;
pub mod sync;
