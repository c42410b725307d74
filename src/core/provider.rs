use crate::core::record::HostOverride;
use crate::error::Error;
use async_trait::async_trait;

/// The remote host-override API, one entity per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverrideClient: Send + Sync {
    /// Full-text search; an empty phrase lists every override.
    async fn search(&self, phrase: &str) -> Result<Vec<HostOverride>, Error>;
    async fn get(&self, id: &str) -> Result<HostOverride, Error>;
    /// Returns the id of the created (or refreshed duplicate) override.
    async fn create(&self, entity: &HostOverride) -> Result<String, Error>;
    /// Full replace of the override stored under `id`.
    async fn update(&self, id: &str, entity: &HostOverride) -> Result<(), Error>;
    async fn delete(&self, id: &str) -> Result<(), Error>;
    /// Activates pending changes on the remote resolver.
    async fn reconfigure(&self) -> Result<(), Error>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// In-memory stand-in for the remote API. Search matches every
    /// whitespace-separated word against the row fields, like the real one.
    #[derive(Default)]
    pub struct FakeOverrideClient {
        rows: Mutex<Vec<HostOverride>>,
        next_id: Mutex<u32>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeOverrideClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_rows(rows: Vec<HostOverride>) -> Self {
            let client = Self::new();
            *client.rows.lock().unwrap() = rows;
            client
        }

        pub fn rows(&self) -> Vec<HostOverride> {
            self.rows.lock().unwrap().clone()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn matches(row: &HostOverride, phrase: &str) -> bool {
            let haystack = format!(
                "{} {} {} {} {} {}",
                row.host, row.domain, row.record_type, row.server, row.txt_data, row.description
            );
            phrase.split_whitespace().all(|word| haystack.contains(word))
        }
    }

    #[async_trait]
    impl OverrideClient for FakeOverrideClient {
        async fn search(&self, phrase: &str) -> Result<Vec<HostOverride>, Error> {
            self.record(format!("search {phrase}"));
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|row| Self::matches(row, phrase))
                .cloned()
                .collect())
        }

        async fn get(&self, id: &str) -> Result<HostOverride, Error> {
            self.record(format!("get {id}"));
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|row| row.id.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| Error::NotFound(id.to_string()))
        }

        async fn create(&self, entity: &HostOverride) -> Result<String, Error> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let id = format!("fake-{next_id}");
            self.record(format!("create {}", entity.fqdn()));
            let mut row = entity.clone();
            row.id = Some(id.clone());
            self.rows.lock().unwrap().push(row);
            Ok(id)
        }

        async fn update(&self, id: &str, entity: &HostOverride) -> Result<(), Error> {
            self.record(format!("update {id}"));
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|row| row.id.as_deref() == Some(id))
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            *row = HostOverride {
                id: Some(id.to_string()),
                ..entity.clone()
            };
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<(), Error> {
            self.record(format!("delete {id}"));
            self.rows
                .lock()
                .unwrap()
                .retain(|row| row.id.as_deref() != Some(id));
            Ok(())
        }

        async fn reconfigure(&self) -> Result<(), Error> {
            self.record("reconfigure".to_string());
            Ok(())
        }
    }
}
