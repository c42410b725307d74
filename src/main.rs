use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod core;
mod error;
mod providers;
mod webhook;

use crate::auth::credentials::EnvCredentialManager;
use crate::config::Config;
use crate::core::reconcile::Reconciler;
use crate::core::record::DomainFilter;
use crate::providers::opnsense::{OpnsenseConfig, OpnsenseProvider};

fn opnsense_config(config: &Config) -> OpnsenseConfig {
    OpnsenseConfig {
        api_url: config.api_host.clone(),
        timeout: config.api_timeout,
        skip_tls_verify: config.skip_tls_verify,
    }
}

fn build_reconciler(config: &Config, provider: OpnsenseProvider) -> Reconciler {
    Reconciler::new(
        Arc::new(provider),
        config.owner_id.clone(),
        DomainFilter::new(config.domain_filter.clone()),
        config.apply_changes,
    )
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Managing Unbound host overrides on {} as owner {:?}",
        config.api_host, config.owner_id
    );

    let provider = OpnsenseProvider::new(opnsense_config(&config), Arc::new(EnvCredentialManager))?;
    let reconciler = Arc::new(build_reconciler(&config, provider));

    let listener = TcpListener::bind(&config.bind).await?;
    webhook::serve(listener, reconciler, shutdown_signal()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::CredentialManager;
    use crate::error::Error;

    struct StaticCredentials;

    impl CredentialManager for StaticCredentials {
        fn get(&self, key: &str) -> Result<String, Error> {
            Ok(format!("{key}-value"))
        }
    }

    #[test]
    fn test_opnsense_config_from_config() {
        let config = Config {
            api_timeout: std::time::Duration::from_secs(5),
            skip_tls_verify: true,
            ..Default::default()
        };
        let opnsense = opnsense_config(&config);
        assert_eq!(opnsense.api_url, "https://firewall.example.com");
        assert_eq!(opnsense.timeout, std::time::Duration::from_secs(5));
        assert!(opnsense.skip_tls_verify);
    }

    #[test]
    fn test_build_reconciler_uses_domain_filter() {
        let config = Config {
            domain_filter: vec![" Example.COM ".to_string()],
            ..Default::default()
        };
        let provider =
            OpnsenseProvider::new(opnsense_config(&config), Arc::new(StaticCredentials)).unwrap();
        let reconciler = build_reconciler(&config, provider);
        assert_eq!(reconciler.domain_filter().domains, vec!["example.com"]);
    }
}
