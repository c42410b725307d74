use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A host override row as the Unbound settings API speaks it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OpnsenseHostOverride {
    #[serde(default, skip_serializing)]
    pub uuid: String,
    #[serde(default)]
    pub enabled: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default, rename = "rr")]
    pub record_type: String,
    #[serde(default)]
    pub mxprio: String,
    #[serde(default)]
    pub mx: String,
    #[serde(default)]
    pub ttl: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub txtdata: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct HostRequest<'a> {
    pub host: &'a OpnsenseHostOverride,
}

#[derive(Serialize)]
pub struct SearchRequest<'a> {
    pub current: u32,
    #[serde(rename = "rowCount")]
    pub row_count: i32,
    pub sort: BTreeMap<String, String>,
    #[serde(rename = "searchPhrase")]
    pub search_phrase: &'a str,
}

impl<'a> SearchRequest<'a> {
    /// Single page holding every match.
    pub fn all(search_phrase: &'a str) -> Self {
        Self {
            current: 1,
            row_count: -1,
            sort: BTreeMap::new(),
            search_phrase,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SearchResponse {
    #[serde(default)]
    pub rows: Vec<OpnsenseHostOverride>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Deserialize, Debug)]
pub struct MutationResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub validations: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
pub struct ServiceResponse {
    #[serde(default)]
    pub status: String,
}

/// One choice of an option field in a `get_host_override` answer.
#[derive(Deserialize, Debug, Default)]
pub struct OptionValue {
    #[serde(default)]
    pub selected: i64,
}

/// `get_host_override` returns `rr` as an option map instead of a string.
#[derive(Deserialize, Debug, Default)]
pub struct HostDetail {
    #[serde(default)]
    pub enabled: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub rr: BTreeMap<String, OptionValue>,
    #[serde(default)]
    pub mxprio: String,
    #[serde(default)]
    pub mx: String,
    #[serde(default)]
    pub ttl: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub txtdata: String,
    #[serde(default)]
    pub description: String,
}

impl HostDetail {
    pub fn into_override(self, uuid: &str) -> OpnsenseHostOverride {
        let record_type = self
            .rr
            .iter()
            .find(|(_, option)| option.selected == 1)
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        OpnsenseHostOverride {
            uuid: uuid.to_string(),
            enabled: self.enabled,
            hostname: self.hostname,
            domain: self.domain,
            record_type,
            mxprio: self.mxprio,
            mx: self.mx,
            ttl: self.ttl,
            server: self.server,
            txtdata: self.txtdata,
            description: self.description,
        }
    }
}

use crate::core::record::HostOverride;

pub fn to_host_override(row: &OpnsenseHostOverride) -> HostOverride {
    // Search results may label the type, e.g. "A (IPv4 address)".
    let record_type = row
        .record_type
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    HostOverride {
        id: (!row.uuid.is_empty()).then(|| row.uuid.clone()),
        host: row.hostname.clone(),
        domain: row.domain.clone(),
        record_type,
        server: row.server.clone(),
        txt_data: row.txtdata.clone(),
        ttl: row.ttl.clone(),
        enabled: row.enabled == "1",
        description: row.description.clone(),
    }
}

pub fn to_opnsense_override(entity: &HostOverride) -> OpnsenseHostOverride {
    OpnsenseHostOverride {
        uuid: entity.id.clone().unwrap_or_default(),
        enabled: if entity.enabled { "1" } else { "0" }.to_string(),
        hostname: entity.host.clone(),
        domain: entity.domain.clone(),
        record_type: entity.record_type.clone(),
        mxprio: String::new(),
        mx: String::new(),
        ttl: entity.ttl.clone(),
        server: entity.server.clone(),
        txtdata: entity.txt_data.clone(),
        description: entity.description.clone(),
    }
}
