use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneInfo {
    pub zone_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

impl From<Zone> for ZoneInfo {
    fn from(zone: Zone) -> Self {
        Self {
            zone_id: zone.id,
            name: zone.name,
        }
    }
}

/// Record IDs issued by the API are 32 characters; anything shorter in state predates them.
pub fn is_record_id(input: &str) -> bool {
    input.len() >= 32 && input.chars().all(|c| c.is_ascii_alphanumeric())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub zone_name: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub proxiable: bool,
    #[serde(default)]
    pub priority: Option<u16>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub modified_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnsRecordRequest {
    #[serde(rename = "type")]
    pub type_: String,
    pub name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginCaCertificateRequest {
    pub csr: String,
    pub hostnames: Vec<String>,
    pub request_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_validity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OriginCaCertificate {
    pub id: String,
    #[serde(default)]
    pub certificate: String,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub request_type: String,
    #[serde(default)]
    pub requested_validity: Option<u32>,
    #[serde(default)]
    pub csr: String,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub expires_on: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Unix seconds of `0001-01-01T00:00:00Z`.
const ZERO_TIME_UNIX: i64 = -62_135_596_800;

impl OriginCaCertificate {
    /// The API reports "never revoked" either as a missing field or as the zero time.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some_and(|at| {
            at.timestamp() != ZERO_TIME_UNIX || at.timestamp_subsec_nanos() != 0
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RevokedCertificate {
    pub id: String,
}

pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Accepts RFC 3339 as well as `2024-01-01 05:20:00.12345 +0000 UTC`.
    pub fn parse(input: &str) -> Option<DateTime<Utc>> {
        let input = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(dt.with_timezone(&Utc));
        }

        let candidates = [
            Some(input),
            input.rsplit_once(' ').map(|(head, _zone_name)| head),
        ];
        candidates
            .into_iter()
            .flatten()
            .find_map(|s| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z").ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
        }
    }
}
