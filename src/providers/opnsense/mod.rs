//! OPNsense Unbound host-override provider

pub mod client;
pub mod error;
pub mod types;


pub use client::{OpnsenseConfig, OpnsenseProvider};
pub use error::OpnsenseProviderError;

// --- OverrideClient trait implementation for OpnsenseProvider ---
use crate::core::provider::OverrideClient;
use crate::core::record::HostOverride;
use crate::error::Error;
use async_trait::async_trait;
use error::map_error;
use types::{to_host_override, to_opnsense_override};

#[async_trait]
impl OverrideClient for OpnsenseProvider {
    async fn search(&self, phrase: &str) -> Result<Vec<HostOverride>, Error> {
        self.search_host_overrides(phrase)
            .await
            .map(|rows| rows.iter().map(to_host_override).collect())
            .map_err(map_error)
    }

    async fn get(&self, id: &str) -> Result<HostOverride, Error> {
        self.get_host_override(id)
            .await
            .map(|row| to_host_override(&row))
            .map_err(map_error)
    }

    async fn create(&self, entity: &HostOverride) -> Result<String, Error> {
        self.upsert_host_override(&to_opnsense_override(entity))
            .await
            .map_err(map_error)
    }

    async fn update(&self, id: &str, entity: &HostOverride) -> Result<(), Error> {
        self.set_host_override(id, &to_opnsense_override(entity))
            .await
            .map_err(map_error)
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        self.del_host_override(id).await.map_err(map_error)
    }

    async fn reconfigure(&self) -> Result<(), Error> {
        OpnsenseProvider::reconfigure(self).await.map_err(map_error)
    }
}
