use std::collections::BTreeMap;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::core::reconcile::ChangeSet;
use crate::core::record::{DNSRecordType, Identity, LogicalRecord};

pub const MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

const OWNER_LABEL: &str = "owner";
const IDENTITY_PROPERTY: &str = "uuid";
const IDENTITY_ALIAS: &str = "id";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub dns_name: String,
    #[serde(default)]
    pub targets: Vec<String>,
    pub record_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
    #[serde(default, rename = "recordTTL", skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

impl From<&Endpoint> for LogicalRecord {
    fn from(endpoint: &Endpoint) -> Self {
        let mut identity = Identity::new();
        for property in endpoint
            .provider_specific
            .iter()
            .filter(|p| p.name == IDENTITY_PROPERTY || p.name == IDENTITY_ALIAS)
        {
            identity.extend(&Identity::parse(&property.value));
        }

        LogicalRecord {
            name: endpoint.dns_name.clone(),
            record_type: DNSRecordType::from(endpoint.record_type.as_str()),
            targets: endpoint.targets.clone(),
            ttl: endpoint.record_ttl.unwrap_or_default(),
            owner: endpoint.labels.get(OWNER_LABEL).cloned().unwrap_or_default(),
            identity,
        }
    }
}

impl From<&LogicalRecord> for Endpoint {
    fn from(record: &LogicalRecord) -> Self {
        let mut labels = BTreeMap::new();
        if !record.owner.is_empty() {
            labels.insert(OWNER_LABEL.to_string(), record.owner.clone());
        }
        let provider_specific = if record.identity.is_empty() {
            Vec::new()
        } else {
            vec![ProviderSpecificProperty {
                name: IDENTITY_PROPERTY.to_string(),
                value: record.identity.encode(),
            }]
        };

        Endpoint {
            dns_name: record.name.clone(),
            targets: record.targets.clone(),
            record_type: record.record_type.to_string(),
            set_identifier: String::new(),
            record_ttl: (record.ttl > 0).then_some(record.ttl),
            labels,
            provider_specific,
        }
    }
}

/// Change batch as posted to `/records`. Keys are accepted in either the
/// controller's `Create` spelling or camelCase.
#[derive(Deserialize, Debug, Default)]
pub struct Changes {
    #[serde(default, rename = "Create", alias = "create")]
    pub create: Vec<Endpoint>,
    // UpdateOld/updateOld is ignored; updates are resolved from UpdateNew.
    #[serde(default, rename = "UpdateNew", alias = "updateNew")]
    pub update_new: Vec<Endpoint>,
    #[serde(default, rename = "Delete", alias = "delete")]
    pub delete: Vec<Endpoint>,
}

impl From<&Changes> for ChangeSet {
    fn from(changes: &Changes) -> Self {
        fn convert(endpoints: &[Endpoint]) -> Vec<LogicalRecord> {
            endpoints.iter().map(LogicalRecord::from).collect()
        }
        ChangeSet {
            create: convert(&changes.create),
            update_new: convert(&changes.update_new),
            delete: convert(&changes.delete),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct DomainFilterBody {
    pub domains: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct Negotiation {
    #[serde(rename = "DomainFilter")]
    pub domain_filter: DomainFilterBody,
}

/// JSON body sent with the webhook media type.
pub struct Edns<T>(pub T);

impl<T: Serialize> IntoResponse for Edns<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, MEDIA_TYPE)], body).into_response(),
            Err(e) => {
                error!("Failed to encode response: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_to_record_reads_both_identity_names() {
        let endpoint: Endpoint = serde_json::from_value(json!({
            "dnsName": "www.example.com",
            "targets": ["1.2.3.4", "5.6.7.8"],
            "recordType": "A",
            "recordTTL": 300,
            "labels": {"owner": "cluster-a"},
            "providerSpecific": [
                {"name": "uuid", "value": "u1=1.2.3.4"},
                {"name": "id", "value": "u2=5.6.7.8"},
                {"name": "alias", "value": "false"}
            ]
        }))
        .unwrap();

        let record = LogicalRecord::from(&endpoint);

        assert_eq!(record.name, "www.example.com");
        assert_eq!(record.record_type, DNSRecordType::A);
        assert_eq!(record.ttl, 300);
        assert_eq!(record.owner, "cluster-a");
        assert_eq!(record.identity.ids("1.2.3.4"), vec!["u1"]);
        assert_eq!(record.identity.ids("5.6.7.8"), vec!["u2"]);
    }

    #[test]
    fn test_record_to_endpoint() {
        let mut record = LogicalRecord::new(
            "www.example.com",
            DNSRecordType::TXT,
            vec!["hello".to_string()],
        );
        record.owner = "default".to_string();
        record.identity.insert("hello", "u1");

        let body = serde_json::to_value(Endpoint::from(&record)).unwrap();

        assert_eq!(
            body,
            json!({
                "dnsName": "www.example.com",
                "targets": ["hello"],
                "recordType": "TXT",
                "labels": {"owner": "default"},
                "providerSpecific": [{"name": "uuid", "value": "u1=hello"}]
            })
        );
    }

    #[test]
    fn test_changes_accept_camel_case_keys() {
        let changes: Changes = serde_json::from_value(json!({
            "create": [{"dnsName": "a.example.com", "recordType": "A", "targets": ["1.1.1.1"]}],
            "updateOld": [{"dnsName": "b.example.com", "recordType": "A", "targets": ["2.2.2.2"]}],
            "updateNew": [{"dnsName": "b.example.com", "recordType": "A", "targets": ["3.3.3.3"]}],
            "delete": [{"dnsName": "c.example.com", "recordType": "TXT", "targets": ["bye"]}]
        }))
        .unwrap();
        let set = ChangeSet::from(&changes);
        assert_eq!(set.create[0].name, "a.example.com");
        assert_eq!(set.update_new[0].targets, vec!["3.3.3.3"]);
        assert_eq!(set.delete[0].name, "c.example.com");
    }

    #[test]
    fn test_changes_default_to_empty() {
        let changes: Changes = serde_json::from_value(json!({
            "Create": [{"dnsName": "a.example.com", "recordType": "A", "targets": ["1.1.1.1"]}]
        }))
        .unwrap();
        let set = ChangeSet::from(&changes);
        assert_eq!(set.create.len(), 1);
        assert!(set.update_new.is_empty());
        assert!(set.delete.is_empty());
    }
}
