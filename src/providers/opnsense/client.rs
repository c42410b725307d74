use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::auth::credentials::CredentialManager;
use crate::providers::opnsense::error::OpnsenseProviderError;
use crate::providers::opnsense::types::*;

pub struct OpnsenseConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub skip_tls_verify: bool,
}

pub struct OpnsenseProvider {
    config: OpnsenseConfig,
    client: Client,
    api_key: String,
    api_secret: String,
}

impl fmt::Debug for OpnsenseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key pair left out.
        f.debug_struct("OpnsenseProvider")
            .field("api_url", &self.config.api_url)
            .field("timeout", &self.config.timeout)
            .field("skip_tls_verify", &self.config.skip_tls_verify)
            .finish_non_exhaustive()
    }
}

impl OpnsenseProvider {
    /// Reads the API key pair up front; missing credentials fail here, at boot.
    pub fn new(
        config: OpnsenseConfig,
        credentials: Arc<dyn CredentialManager>,
    ) -> Result<Self, OpnsenseProviderError> {
        let api_key = credentials
            .get("opnsense_api_key")
            .map_err(|e| OpnsenseProviderError::Credential(e.to_string()))?;
        let api_secret = credentials
            .get("opnsense_api_secret")
            .map_err(|e| OpnsenseProviderError::Credential(e.to_string()))?;

        if config.skip_tls_verify {
            warn!("TLS certificate verification is disabled for {}", config.api_url);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()?;

        Ok(Self {
            config,
            client,
            api_key,
            api_secret,
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!(
            "{}/api/unbound/{}",
            self.config.api_url.trim_end_matches('/'),
            endpoint
        );
        self.client
            .request(method, url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
    }

    async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Response, OpnsenseProviderError> {
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(OpnsenseProviderError::Credential(format!(
                    "{} rejected the API key for {}",
                    self.config.api_url, endpoint
                )))
            }
            status => Err(OpnsenseProviderError::Status {
                endpoint: endpoint.to_string(),
                status,
            }),
        }
    }

    async fn handle_request<T>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, OpnsenseProviderError>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.send(endpoint, request).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn check_saved(
        endpoint: &str,
        response: &MutationResponse,
    ) -> Result<(), OpnsenseProviderError> {
        if response.result == "saved" {
            return Ok(());
        }
        let result = match &response.validations {
            Some(validations) => format!("{} {}", response.result, validations),
            None => response.result.clone(),
        };
        Err(OpnsenseProviderError::Rejected {
            endpoint: endpoint.to_string(),
            result,
        })
    }

    pub async fn search_host_overrides(
        &self,
        phrase: &str,
    ) -> Result<Vec<OpnsenseHostOverride>, OpnsenseProviderError> {
        let endpoint = "settings/search_host_override/";
        let request = self
            .request(Method::POST, endpoint)
            .json(&SearchRequest::all(phrase));
        let response: SearchResponse = self.handle_request(endpoint, request).await?;
        debug!(
            "Search '{}' returned {} of {} override(s)",
            phrase,
            response.rows.len(),
            response.total
        );
        Ok(response.rows)
    }

    pub async fn get_host_override(
        &self,
        uuid: &str,
    ) -> Result<OpnsenseHostOverride, OpnsenseProviderError> {
        let endpoint = format!("settings/get_host_override/{uuid}");
        let request = self.request(Method::GET, &endpoint);
        // Unknown ids come back as an empty list rather than a 404.
        let value: serde_json::Value = self.handle_request(&endpoint, request).await?;
        match value.get("host") {
            Some(host) if host.is_object() => {
                let detail: HostDetail = serde_json::from_value(host.clone())?;
                Ok(detail.into_override(uuid))
            }
            _ => Err(OpnsenseProviderError::NotFound(format!(
                "host override {uuid}"
            ))),
        }
    }

    pub async fn add_host_override(
        &self,
        host: &OpnsenseHostOverride,
    ) -> Result<String, OpnsenseProviderError> {
        let endpoint = "settings/add_host_override/";
        info!(
            "Creating DNS entry [{}] {}.{} => {}{} (TTL {})",
            host.record_type, host.hostname, host.domain, host.server, host.txtdata, host.ttl
        );
        let request = self
            .request(Method::POST, endpoint)
            .json(&HostRequest { host });
        let response: MutationResponse = self.handle_request(endpoint, request).await?;
        Self::check_saved(endpoint, &response)?;
        response.uuid.ok_or_else(|| OpnsenseProviderError::Rejected {
            endpoint: endpoint.to_string(),
            result: "saved without uuid".to_string(),
        })
    }

    pub async fn set_host_override(
        &self,
        uuid: &str,
        host: &OpnsenseHostOverride,
    ) -> Result<(), OpnsenseProviderError> {
        let endpoint = format!("settings/set_host_override/{uuid}");
        let request = self
            .request(Method::POST, &endpoint)
            .json(&HostRequest { host });
        let response: MutationResponse = self.handle_request(&endpoint, request).await?;
        Self::check_saved(&endpoint, &response)
    }

    pub async fn del_host_override(&self, uuid: &str) -> Result<(), OpnsenseProviderError> {
        let endpoint = format!("settings/del_host_override/{uuid}");
        let request = self.request(Method::POST, &endpoint);
        self.send(&endpoint, request).await?;
        info!("Deleted DNS entry with UUID {}", uuid);
        Ok(())
    }

    /// Creates the override, or refreshes it in place when an identical
    /// `(host, domain, type, value)` row already exists. Identical rows owned by
    /// another description are left alone and a new row is added beside them.
    pub async fn upsert_host_override(
        &self,
        host: &OpnsenseHostOverride,
    ) -> Result<String, OpnsenseProviderError> {
        let phrase = format!("{} {}", host.hostname, host.domain);
        let (duplicates, foreign): (Vec<_>, Vec<_>) = self
            .search_host_overrides(&phrase)
            .await?
            .into_iter()
            .filter(|row| is_duplicate(row, host))
            .partition(|row| row.description.is_empty() || row.description == host.description);
        for row in &foreign {
            warn!(
                "Host override {} for {}.{} is owned by {:?}, not taking it over",
                row.uuid, host.hostname, host.domain, row.description
            );
        }

        match duplicates.as_slice() {
            [] => self.add_host_override(host).await,
            [existing] => {
                info!(
                    "Host override {}.{} already exists as {}, updating",
                    host.hostname, host.domain, existing.uuid
                );
                self.set_host_override(&existing.uuid, host).await?;
                Ok(existing.uuid.clone())
            }
            several => Err(OpnsenseProviderError::Ambiguous(format!(
                "{} host overrides already hold [{}] {}.{}",
                several.len(),
                host.record_type,
                host.hostname,
                host.domain
            ))),
        }
    }

    pub async fn reconfigure(&self) -> Result<(), OpnsenseProviderError> {
        let endpoint = "service/reconfigure";
        let request = self.request(Method::POST, endpoint);
        let response: ServiceResponse = self.handle_request(endpoint, request).await?;
        if response.status.eq_ignore_ascii_case("ok") {
            info!("Unbound reconfigured");
            Ok(())
        } else {
            Err(OpnsenseProviderError::Rejected {
                endpoint: endpoint.to_string(),
                result: response.status,
            })
        }
    }
}

fn is_duplicate(row: &OpnsenseHostOverride, host: &OpnsenseHostOverride) -> bool {
    let row = to_host_override(row);
    let wanted = to_host_override(host);
    !row.host.is_empty()
        && row.host == wanted.host
        && row.domain == wanted.domain
        && row.record_type == wanted.record_type
        && row.value() == wanted.value()
}
