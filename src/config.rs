use std::env;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_OWNER: &str = "default";
const DEFAULT_BIND: &str = "0.0.0.0:8888";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_host: String,
    pub api_timeout: Duration,
    pub skip_tls_verify: bool,
    pub apply_changes: bool,
    pub domain_filter: Vec<String>,
    pub owner_id: String,
    pub bind: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        let api_host = var("OPNSENSE_API_HOST").unwrap_or_else(|| {
            missing.push("OPNSENSE_API_HOST");
            String::new()
        });
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required variable(s): {}",
                missing.join(", ")
            )));
        }

        let api_timeout = match var("OPNSENSE_API_TIMEOUT") {
            Some(raw) => humantime::parse_duration(&raw).unwrap_or_else(|e| {
                warn!(
                    "Invalid OPNSENSE_API_TIMEOUT {:?} ({}), using {:?}",
                    raw, e, DEFAULT_TIMEOUT
                );
                DEFAULT_TIMEOUT
            }),
            None => DEFAULT_TIMEOUT,
        };

        let owner_id = var("EXTERNAL_DNS_OWNER").unwrap_or_else(|| {
            info!("EXTERNAL_DNS_OWNER not set, using {:?}", DEFAULT_OWNER);
            DEFAULT_OWNER.to_string()
        });

        Ok(Config {
            api_host,
            api_timeout,
            skip_tls_verify: flag(var("OPNSENSE_SKIP_TLS_VERIFY"), false),
            apply_changes: flag(var("OPNSENSE_APPLY_CHANGES"), true),
            domain_filter: var("DOMAIN_FILTER")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|domain| !domain.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            owner_id,
            bind: var("WEBHOOK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        })
    }
}

fn flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            warn!("Unrecognised boolean {:?}, using {}", other, default);
            default
        }
        None => default,
    }
}
