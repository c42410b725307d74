use crate::error::Error;
use std::fmt;

/// Separator between identity fragments in provider-specific metadata.
const IDENTITY_SEPARATOR: &str = ";";

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DNSRecordType {
    A,
    AAAA,
    TXT,
    /// Anything the override API can hold that this adapter does not manage.
    Unsupported(String),
}

impl DNSRecordType {
    pub fn is_supported(&self) -> bool {
        !matches!(self, DNSRecordType::Unsupported(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            DNSRecordType::A => "A",
            DNSRecordType::AAAA => "AAAA",
            DNSRecordType::TXT => "TXT",
            DNSRecordType::Unsupported(other) => other,
        }
    }
}

impl From<&str> for DNSRecordType {
    fn from(value: &str) -> Self {
        match value {
            "A" => DNSRecordType::A,
            "AAAA" => DNSRecordType::AAAA,
            "TXT" => DNSRecordType::TXT,
            other => DNSRecordType::Unsupported(other.to_string()),
        }
    }
}

impl From<DNSRecordType> for String {
    fn from(value: DNSRecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DNSRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target value to remote override id, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity(Vec<(String, String)>);

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Every id carried for `target`. Merged rows can leave several.
    pub fn ids(&self, target: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, id)| id.as_str())
            .collect()
    }

    /// Adds a pairing unless the identical pairing is already known.
    pub fn insert(&mut self, target: impl Into<String>, id: impl Into<String>) {
        let (target, id) = (target.into(), id.into());
        if !self.0.iter().any(|(t, i)| *t == target && *i == id) {
            self.0.push((target, id));
        }
    }

    pub fn extend(&mut self, other: &Identity) {
        for (target, id) in &other.0 {
            self.insert(target.clone(), id.clone());
        }
    }

    /// Encodes as `id=target` fragments joined by `;`. Both sides are
    /// percent-encoded, so TXT values holding `;` or `=` survive.
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(target, id)| {
                format!(
                    "{}={}",
                    urlencoding::encode(id),
                    urlencoding::encode(target)
                )
            })
            .collect::<Vec<_>>()
            .join(IDENTITY_SEPARATOR)
    }

    /// Inverse of [`Identity::encode`]. Fragments without an `=` or with bad
    /// escapes are ignored, so a mangled value degrades to value matching
    /// instead of failing the request.
    pub fn parse(encoded: &str) -> Self {
        let mut identity = Identity::new();
        for fragment in encoded.split(IDENTITY_SEPARATOR) {
            let Some((id, target)) = fragment.split_once('=') else {
                continue;
            };
            let (Ok(id), Ok(target)) = (urlencoding::decode(id), urlencoding::decode(target))
            else {
                continue;
            };
            if id.is_empty() {
                continue;
            }
            identity.insert(target, id);
        }
        identity
    }
}

/// Controller-side record: one name and type, any number of targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRecord {
    pub name: String,
    pub record_type: DNSRecordType,
    pub targets: Vec<String>,
    pub ttl: i64,
    pub owner: String,
    pub identity: Identity,
}

impl LogicalRecord {
    pub fn new(name: impl Into<String>, record_type: DNSRecordType, targets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            record_type,
            targets,
            ttl: 0,
            owner: String::new(),
            identity: Identity::new(),
        }
    }

    /// Splits the name into host label and domain on the first dot.
    pub fn split_name(&self) -> Result<(String, String), Error> {
        split_name(&self.name)
    }

    pub fn add_target(&mut self, target: &str) {
        if !self.targets.iter().any(|t| t == target) {
            self.targets.push(target.to_string());
        }
    }
}

pub fn split_name(name: &str) -> Result<(String, String), Error> {
    let name = name.strip_suffix('.').unwrap_or(name);
    match name.split_once('.') {
        Some((host, domain)) if !host.is_empty() && !domain.is_empty() => {
            Ok((host.to_string(), domain.to_string()))
        }
        _ => Err(Error::InvalidInput(format!("invalid DNS name: {name}"))),
    }
}

/// Remote-side host override: exactly one target value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostOverride {
    pub id: Option<String>,
    pub host: String,
    pub domain: String,
    pub record_type: String,
    /// Address for A/AAAA overrides.
    pub server: String,
    /// Text for TXT overrides.
    pub txt_data: String,
    pub ttl: String,
    pub enabled: bool,
    /// Carries the owner id of the instance that manages the override.
    pub description: String,
}

impl HostOverride {
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.host, self.domain)
    }

    pub fn record_type(&self) -> DNSRecordType {
        DNSRecordType::from(self.record_type.as_str())
    }

    /// The field holding this override's target, chosen by record type.
    pub fn value(&self) -> Option<&str> {
        match self.record_type() {
            DNSRecordType::A | DNSRecordType::AAAA => Some(&self.server),
            DNSRecordType::TXT => Some(&self.txt_data),
            DNSRecordType::Unsupported(_) => None,
        }
    }

    pub fn set_value(&mut self, value: &str) {
        match self.record_type() {
            DNSRecordType::A | DNSRecordType::AAAA => self.server = value.to_string(),
            DNSRecordType::TXT => self.txt_data = value.to_string(),
            DNSRecordType::Unsupported(_) => {}
        }
    }

    pub fn has_key(&self, host: &str, domain: &str, record_type: &DNSRecordType) -> bool {
        self.host == host && self.domain == domain && self.record_type == record_type.as_str()
    }
}

/// Domains this instance is allowed to report and manage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFilter {
    pub domains: Vec<String>,
}

impl DomainFilter {
    pub fn new(domains: Vec<String>) -> Self {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.trim().trim_matches('.').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// An empty filter matches every name.
    pub fn matches(&self, name: &str) -> bool {
        if self.domains.is_empty() {
            return true;
        }
        let name = name.trim_end_matches('.').to_lowercase();
        self.domains
            .iter()
            .any(|d| name == *d || name.ends_with(&format!(".{d}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_record_type_parse() {
        assert_eq!(DNSRecordType::from("A"), DNSRecordType::A);
        assert_eq!(DNSRecordType::from("AAAA"), DNSRecordType::AAAA);
        assert_eq!(DNSRecordType::from("TXT"), DNSRecordType::TXT);
        let mx = DNSRecordType::from("MX");
        assert_eq!(mx, DNSRecordType::Unsupported("MX".into()));
        assert!(!mx.is_supported());
        assert_eq!(String::from(mx), "MX");
    }

    #[test]
    fn test_split_name() {
        let (host, domain) = split_name("www.example.com").unwrap();
        assert_eq!(host, "www");
        assert_eq!(domain, "example.com");

        let (host, domain) = split_name("www.example.com.").unwrap();
        assert_eq!(host, "www");
        assert_eq!(domain, "example.com");
    }

    #[test]
    fn test_split_name_rejects_single_label() {
        assert_matches!(split_name("noDotHere"), Err(Error::InvalidInput(_)));
        assert_matches!(split_name(".example.com"), Err(Error::InvalidInput(_)));
        assert_matches!(split_name("host."), Err(Error::InvalidInput(_)));
        assert_matches!(split_name(""), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_identity_encode_and_parse() {
        let mut identity = Identity::new();
        identity.insert("1.2.3.4", "u1");
        identity.insert("5.6.7.8", "u2");
        identity.insert("1.2.3.4", "u1");
        assert_eq!(identity.len(), 2);

        let encoded = identity.encode();
        assert_eq!(encoded, "u1=1.2.3.4;u2=5.6.7.8");
        assert_eq!(Identity::parse(&encoded), identity);
    }

    #[test]
    fn test_identity_parse_keeps_equals_in_target() {
        let identity = Identity::parse("u1=heritage=external-dns,external-dns/owner=default");
        assert_eq!(
            identity.ids("heritage=external-dns,external-dns/owner=default"),
            vec!["u1"]
        );
    }

    #[test]
    fn test_identity_round_trips_txt_with_separators() {
        let dkim = "v=DKIM1; k=rsa; p=ABC";
        let mut identity = Identity::new();
        identity.insert(dkim, "u1");
        identity.insert("v=spf1 include:example.com ~all", "u2");

        let encoded = identity.encode();
        assert_eq!(encoded.matches(';').count(), 1);

        let parsed = Identity::parse(&encoded);
        assert_eq!(parsed, identity);
        assert_eq!(parsed.ids(dkim), vec!["u1"]);
    }

    #[test]
    fn test_identity_keeps_every_id_of_a_target() {
        let identity = Identity::parse("u1=1.2.3.4;u5=1.2.3.4;u2=5.6.7.8");
        assert_eq!(identity.ids("1.2.3.4"), vec!["u1", "u5"]);
        assert_eq!(identity.ids("5.6.7.8"), vec!["u2"]);
        assert!(identity.ids("9.9.9.9").is_empty());
    }

    #[test]
    fn test_identity_parse_ignores_garbage() {
        let identity = Identity::parse("justanid;=orphan;;u2=2.2.2.2");
        assert_eq!(identity.len(), 1);
        assert_eq!(identity.ids("2.2.2.2"), vec!["u2"]);
    }

    #[test]
    fn test_override_value_by_type() {
        let mut a = HostOverride {
            record_type: "A".into(),
            server: "1.2.3.4".into(),
            txt_data: "ignored".into(),
            ..Default::default()
        };
        assert_eq!(a.value(), Some("1.2.3.4"));
        a.set_value("4.3.2.1");
        assert_eq!(a.server, "4.3.2.1");

        let txt = HostOverride {
            record_type: "TXT".into(),
            server: "ignored".into(),
            txt_data: "hello".into(),
            ..Default::default()
        };
        assert_eq!(txt.value(), Some("hello"));

        let mx = HostOverride {
            record_type: "MX".into(),
            ..Default::default()
        };
        assert_eq!(mx.value(), None);
    }

    #[test]
    fn test_domain_filter() {
        let filter = DomainFilter::new(vec!["example.com".into(), " ".into()]);
        assert_eq!(filter.domains, vec!["example.com".to_string()]);
        assert!(filter.matches("example.com"));
        assert!(filter.matches("www.Example.com."));
        assert!(!filter.matches("badexample.com"));
        assert!(!filter.matches("example.org"));
        assert!(DomainFilter::default().matches("anything.at.all"));
    }
}
