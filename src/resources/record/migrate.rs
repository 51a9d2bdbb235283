//! Upgrade of `cloudflare_record` state written before records were keyed by
//! their API id.
//!
//! Schema v0 stored whatever identifier the first provider releases produced
//! (often the zone name). The upgrade finds the live record by comparing the
//! stored attributes against every record in the zone and adopts its id.

use std::str::FromStr;

use crate::cloudflare::{CloudflareClient, CloudflareError, DnsRecord, ZoneInfo, is_record_id};
use crate::resource::ResourceError;
use crate::terraform::state::InstanceState;

use super::SCHEMA_VERSION;

/// Typed view of the attributes the matcher needs from v0 state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LegacyRecord {
    pub name: String,
    pub record_type: String,
    pub content: Option<String>,
    pub ttl: Option<u32>,
    pub proxied: Option<bool>,
    pub priority: Option<u16>,
    pub domain: Option<String>,
    pub zone_id: Option<String>,
}

impl LegacyRecord {
    pub fn from_state(state: &InstanceState) -> Result<Self, ResourceError> {
        let record_type = state
            .attribute("type")
            .ok_or(ResourceError::MissingAttribute("type"))?;
        let name = state
            .attribute("hostname")
            .or_else(|| state.attribute("name"))
            .ok_or(ResourceError::MissingAttribute("name"))?;

        Ok(Self {
            name: name.to_string(),
            record_type: record_type.to_string(),
            content: state
                .attribute("content")
                .or_else(|| state.attribute("value"))
                .map(str::to_string),
            ttl: parse_attribute(state, "ttl")?,
            proxied: parse_attribute(state, "proxied")?,
            priority: parse_attribute(state, "priority")?,
            domain: state.attribute("domain").map(str::to_string),
            zone_id: state.attribute("zone_id").map(str::to_string),
        })
    }

    /// Fully qualified record name; relative names are resolved against `zone`.
    pub fn fqdn(&self, zone: &str) -> String {
        let name = self.name.trim_end_matches('.');
        let suffix = format!(".{}", zone.to_ascii_lowercase());

        if name == "@" || name.eq_ignore_ascii_case(zone) {
            zone.to_string()
        } else if name.to_ascii_lowercase().ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}.{}", name, zone)
        }
    }

    /// The name without its leftmost label. Two-label names are their own apex.
    pub fn derived_domain(&self) -> String {
        let name = self.name.trim_end_matches('.');
        match name.split_once('.') {
            Some((_, rest)) if rest.contains('.') => rest.to_string(),
            _ => name.to_string(),
        }
    }
}

fn parse_attribute<T: FromStr>(
    state: &InstanceState,
    key: &'static str,
) -> Result<Option<T>, ResourceError> {
    state
        .attribute(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| ResourceError::InvalidAttribute {
                key,
                value: raw.to_string(),
            })
        })
        .transpose()
}

/// Rewrites v0 state so its id is the API id of the record it describes.
///
/// State that is already current, empty, or already keyed by a record id is
/// returned untouched without calling the API.
pub async fn migrate_state(
    version: u32,
    mut state: InstanceState,
    client: &CloudflareClient,
) -> Result<InstanceState, ResourceError> {
    if version >= SCHEMA_VERSION {
        tracing::debug!(version, "record state is current; nothing to migrate");
        return Ok(state);
    }
    if state.is_empty() {
        tracing::debug!("empty record state; nothing to migrate");
        return Ok(state);
    }
    if is_record_id(&state.id) {
        tracing::info!(record_id = %state.id, "record state already keyed by record id");
        return Ok(state);
    }

    tracing::info!(version, to = SCHEMA_VERSION, "migrating cloudflare_record state");
    tracing::debug!(attributes = ?state.attributes, "attributes before migration");

    let record = LegacyRecord::from_state(&state)?;
    let zone = resolve_zone(&record, client).await?;
    let fqdn = record.fqdn(&zone.name);

    let records = client
        .list_dns_records(&zone.zone_id)
        .await
        .map_err(ResourceError::api(format!(
            "error listing DNS records for zone {}",
            zone.name
        )))?;

    let matched = select_record(&record, &fqdn, records)?;

    tracing::info!(
        old_id = %state.id,
        record_id = %matched.id,
        zone_id = %zone.zone_id,
        "migrated record state"
    );

    state.set_id(matched.id);
    if state.attribute("zone_id").is_none() {
        state.attributes.insert("zone_id".to_string(), zone.zone_id);
    }

    Ok(state)
}

async fn resolve_zone(
    record: &LegacyRecord,
    client: &CloudflareClient,
) -> Result<ZoneInfo, ResourceError> {
    let lookup = match (&record.domain, &record.zone_id) {
        (Some(domain), _) => client.lookup_zone_by_name(domain).await,
        (None, Some(zone_id)) => client.lookup_zone_by_id(zone_id).await,
        (None, None) => client.lookup_zone_by_name(&record.derived_domain()).await,
    };

    lookup.map_err(|e| match e {
        CloudflareError::ZoneNotFound { zone } => ResourceError::ZoneNotFound { zone },
        other => ResourceError::api("error resolving zone for DNS record")(other),
    })
}

/// Picks the one record `record` describes.
///
/// Candidates must share name, type and (when stored) content. Remaining ties
/// are broken by ttl, then proxied, then priority for MX records; a
/// discriminator missing from state is skipped. Anything other than exactly
/// one survivor is an error.
pub(crate) fn select_record(
    record: &LegacyRecord,
    fqdn: &str,
    records: Vec<DnsRecord>,
) -> Result<DnsRecord, ResourceError> {
    let mut candidates: Vec<DnsRecord> = records
        .into_iter()
        .filter(|r| r.name.eq_ignore_ascii_case(fqdn))
        .filter(|r| r.type_.eq_ignore_ascii_case(&record.record_type))
        .filter(|r| record.content.as_ref().is_none_or(|c| &r.content == c))
        .collect();

    let not_found = || ResourceError::RecordNotFound {
        name: fqdn.to_string(),
        record_type: record.record_type.clone(),
    };

    if candidates.is_empty() {
        return Err(not_found());
    }

    if let Some(ttl) = record.ttl {
        candidates.retain(|r| r.ttl == ttl);
    }
    if let Some(proxied) = record.proxied {
        candidates.retain(|r| r.proxied == proxied);
    }
    if record.record_type.eq_ignore_ascii_case("MX") {
        if let Some(priority) = record.priority {
            candidates.retain(|r| r.priority == Some(priority));
        }
    }

    tracing::debug!(name = fqdn, candidates = candidates.len(), "record candidates after filtering");

    if candidates.len() > 1 {
        return Err(ResourceError::AmbiguousRecord {
            name: fqdn.to_string(),
            record_type: record.record_type.clone(),
            candidates: candidates.len(),
        });
    }

    candidates.pop().ok_or_else(not_found)
}
