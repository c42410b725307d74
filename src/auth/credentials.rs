use crate::error::Error;
use std::env;

pub trait CredentialManager: Send + Sync {
    fn get(&self, key: &str) -> Result<String, Error>;
}

/// Reads credentials from the process environment; `opnsense_api_key` is
/// looked up as `OPNSENSE_API_KEY`.
pub struct EnvCredentialManager;

impl EnvCredentialManager {
    fn variable(key: &str) -> String {
        key.to_ascii_uppercase()
    }
}

impl CredentialManager for EnvCredentialManager {
    fn get(&self, key: &str) -> Result<String, Error> {
        let variable = Self::variable(key);
        match env::var(&variable) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(Error::CredentialError(format!("{variable} is not set"))),
        }
    }
}
