use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpnsenseProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous: {0}")]
    Ambiguous(String),

    #[error("Unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: StatusCode },

    #[error("API answered {result:?} from {endpoint}")]
    Rejected { endpoint: String, result: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

use crate::error::Error;

pub fn map_error(e: OpnsenseProviderError) -> Error {
    use OpnsenseProviderError::*;
    match e {
        Http(err) if err.is_timeout() => Error::Timeout(err.to_string()),
        Http(err) => Error::ProviderError(err.to_string()),
        Credential(msg) => Error::CredentialError(msg),
        NotFound(msg) => Error::NotFound(msg),
        Ambiguous(msg) => Error::Ambiguous(msg),
        e @ (Status { .. } | Rejected { .. } | Decode(_)) => Error::ProviderError(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_map_error_variants() {
        use OpnsenseProviderError::*;

        let err = map_error(Credential("fail".to_string()));
        assert!(matches!(err, Error::CredentialError(_)));
        let err = map_error(NotFound("gone".to_string()));
        assert!(matches!(err, Error::NotFound(_)));
        let err = map_error(Ambiguous("two".to_string()));
        assert!(matches!(err, Error::Ambiguous(_)));
        let err = map_error(Status {
            endpoint: "settings/search_host_override/".to_string(),
            status: StatusCode::BAD_GATEWAY,
        });
        assert!(matches!(err, Error::ProviderError(msg) if msg.contains("502")));
        let err = map_error(Rejected {
            endpoint: "settings/add_host_override/".to_string(),
            result: "failed".to_string(),
        });
        assert!(matches!(err, Error::ProviderError(_)));
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = map_error(Decode(decode));
        assert!(matches!(err, Error::ProviderError(_)));
    }
}
