mod migrate;

pub use migrate::migrate_state;

use async_trait::async_trait;
use chrono::SecondsFormat;

use crate::cloudflare::{CloudflareClient, CloudflareError, DnsRecord, DnsRecordRequest};
use crate::resource::{Resource, ResourceData, ResourceError};
use crate::schema::{Attribute, Schema};
use crate::terraform::state::InstanceState;
use crate::validation::string_in_slice;

pub const RESOURCE_TYPE: &str = "cloudflare_record";

/// v1 keys state by the API record id; v0 did not.
pub const SCHEMA_VERSION: u32 = 1;

const RECORD_TYPES: &[&str] = &[
    "A", "AAAA", "CAA", "CERT", "CNAME", "DNSKEY", "DS", "HTTPS", "LOC", "MX", "NAPTR", "NS",
    "PTR", "SMIMEA", "SPF", "SRV", "SSHFP", "SVCB", "TLSA", "TXT", "URI",
];

const RECORD_MISSING: &str = "Record does not exist";

pub struct RecordResource;

impl RecordResource {
    fn request(data: &ResourceData) -> Result<DnsRecordRequest, ResourceError> {
        let ttl = data
            .get_int("ttl")
            .map(|ttl| {
                u32::try_from(ttl).map_err(|_| ResourceError::InvalidAttribute {
                    key: "ttl",
                    value: ttl.to_string(),
                })
            })
            .transpose()?;
        let priority = data
            .get_int("priority")
            .map(|priority| {
                u16::try_from(priority).map_err(|_| ResourceError::InvalidAttribute {
                    key: "priority",
                    value: priority.to_string(),
                })
            })
            .transpose()?;

        Ok(DnsRecordRequest {
            type_: required(data, "type")?.to_ascii_uppercase(),
            name: required(data, "name")?.to_string(),
            content: required(data, "value")?.to_string(),
            ttl,
            priority,
            proxied: data.get_bool("proxied"),
        })
    }

    fn apply(data: &mut ResourceData, record: &DnsRecord) {
        data.set_id(record.id.clone());
        data.set("hostname", record.name.clone());
        data.set("type", record.type_.clone());
        data.set("value", record.content.clone());
        data.set("ttl", record.ttl);
        data.set("proxied", record.proxied);
        data.set("proxiable", record.proxiable);
        if let Some(priority) = record.priority {
            data.set("priority", priority);
        }
        if data.get_str("name").is_none() {
            data.set("name", record.name.clone());
        }
        if let Some(zone_id) = &record.zone_id {
            data.set("zone_id", zone_id.clone());
        }
        if let Some(created_on) = record.created_on {
            data.set("created_on", created_on.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(modified_on) = record.modified_on {
            data.set("modified_on", modified_on.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }
}

fn required<'a>(data: &'a ResourceData, key: &'static str) -> Result<&'a str, ResourceError> {
    data.get_str(key).ok_or(ResourceError::MissingAttribute(key))
}

fn is_missing_record(err: &CloudflareError) -> bool {
    err.status() == Some(404)
        || matches!(err, CloudflareError::Api { message, .. } if message.contains(RECORD_MISSING))
}

#[async_trait]
impl Resource for RecordResource {
    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> Schema {
        Schema::new(SCHEMA_VERSION)
            .attribute(
                "zone_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("Zone the record belongs to"),
            )
            .attribute(
                "name",
                Attribute::string()
                    .required()
                    .description("Record name, relative to the zone or fully qualified"),
            )
            .attribute(
                "hostname",
                Attribute::string()
                    .computed()
                    .description("Fully qualified record name"),
            )
            .attribute(
                "type",
                Attribute::string()
                    .required()
                    .force_new()
                    .case_insensitive()
                    .validator(string_in_slice(RECORD_TYPES, true)),
            )
            .attribute("value", Attribute::string().required())
            .attribute(
                "ttl",
                Attribute::int()
                    .optional()
                    .computed()
                    .description("TTL in seconds; 1 means automatic"),
            )
            .attribute("priority", Attribute::int().optional())
            .attribute("proxied", Attribute::bool().optional())
            .attribute("proxiable", Attribute::bool().computed())
            .attribute("created_on", Attribute::string().computed())
            .attribute("modified_on", Attribute::string().computed())
    }

    async fn create(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let zone_id = required(data, "zone_id")?.to_string();
        let request = Self::request(data)?;

        tracing::info!(
            zone_id = %zone_id,
            name = %request.name,
            record_type = %request.type_,
            "creating DNS record"
        );

        let record = client
            .create_dns_record(&zone_id, &request)
            .await
            .map_err(ResourceError::api("error creating DNS record"))?;

        Self::apply(data, &record);
        Ok(())
    }

    async fn read(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let zone_id = required(data, "zone_id")?.to_string();
        let record_id = data.id().to_string();

        let record = match client.dns_record(&zone_id, &record_id).await {
            Ok(record) => record,
            Err(e) if is_missing_record(&e) => {
                tracing::warn!(record_id = %record_id, "DNS record not found; removing from state");
                data.clear_id();
                return Ok(());
            }
            Err(e) => {
                return Err(ResourceError::api(format!(
                    "error finding DNS record {:?}",
                    record_id
                ))(e));
            }
        };

        Self::apply(data, &record);
        Ok(())
    }

    async fn update(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let zone_id = required(data, "zone_id")?.to_string();
        let record_id = data.id().to_string();
        let request = Self::request(data)?;

        tracing::info!(zone_id = %zone_id, record_id = %record_id, "updating DNS record");

        let record = client
            .update_dns_record(&zone_id, &record_id, &request)
            .await
            .map_err(ResourceError::api(format!(
                "error updating DNS record {:?}",
                record_id
            )))?;

        Self::apply(data, &record);
        Ok(())
    }

    async fn delete(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let zone_id = required(data, "zone_id")?.to_string();
        let record_id = data.id().to_string();

        tracing::info!(zone_id = %zone_id, record_id = %record_id, "deleting DNS record");

        client
            .delete_dns_record(&zone_id, &record_id)
            .await
            .map_err(ResourceError::api(format!(
                "error deleting DNS record {:?}",
                record_id
            )))?;

        data.clear_id();
        Ok(())
    }

    fn import_state(&self, id: &str) -> Result<ResourceData, ResourceError> {
        let invalid = || ResourceError::InvalidImportId {
            id: id.to_string(),
            expected: "<zone_id>/<record_id>",
        };

        let (zone_id, record_id) = id.split_once('/').ok_or_else(invalid)?;
        if zone_id.is_empty() || record_id.is_empty() || record_id.contains('/') {
            return Err(invalid());
        }

        let mut data = ResourceData::with_id(record_id);
        data.set("zone_id", zone_id);
        Ok(data)
    }

    async fn upgrade_state(
        &self,
        version: u32,
        state: InstanceState,
        client: &CloudflareClient,
    ) -> Result<InstanceState, ResourceError> {
        migrate_state(version, state, client).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResourceData {
        let mut data = ResourceData::new();
        data.set("zone_id", "023e105f4ecef8ad9ca31a8372d0c353");
        data.set("name", "www");
        data.set("type", "a");
        data.set("value", "192.0.2.1");
        data
    }

    #[test]
    fn test_schema_accepts_config() {
        assert!(RecordResource.schema().validate(&config()).is_ok());
    }

    #[test]
    fn test_schema_rejects_unknown_type() {
        let mut data = config();
        data.set("type", "BOGUS");
        let errors = RecordResource.schema().validate(&data).unwrap_err();
        assert_eq!(errors.0[0].key, "type");
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(RecordResource.schema().version, SCHEMA_VERSION);
    }

    #[test]
    fn test_request_from_config() {
        let mut data = config();
        data.set("ttl", 300);
        data.set("proxied", true);

        let request = RecordResource::request(&data).unwrap();
        assert_eq!(request.type_, "A");
        assert_eq!(request.name, "www");
        assert_eq!(request.content, "192.0.2.1");
        assert_eq!(request.ttl, Some(300));
        assert_eq!(request.priority, None);
        assert_eq!(request.proxied, Some(true));
    }

    #[test]
    fn test_type_case_does_not_force_replacement() {
        let planned = config();
        let mut prior = planned.clone();
        RecordResource::apply(
            &mut prior,
            &DnsRecord {
                id: "372e67954025e0ba6aaa6d586b9e0b59".to_string(),
                zone_id: Some("023e105f4ecef8ad9ca31a8372d0c353".to_string()),
                zone_name: Some("example.com".to_string()),
                name: "www.example.com".to_string(),
                type_: "A".to_string(),
                content: "192.0.2.1".to_string(),
                ttl: 1,
                proxied: false,
                proxiable: true,
                priority: None,
                created_on: None,
                modified_on: None,
            },
        );

        assert_eq!(prior.get_str("type"), Some("A"));
        assert_eq!(planned.get_str("type"), Some("a"));
        assert!(
            RecordResource
                .schema()
                .replacement_attributes(&prior, &planned)
                .is_empty()
        );
    }

    #[test]
    fn test_request_rejects_negative_ttl() {
        let mut data = config();
        data.set("ttl", -1);
        let err = RecordResource::request(&data).unwrap_err();
        assert!(matches!(err, ResourceError::InvalidAttribute { key: "ttl", .. }));
    }

    #[test]
    fn test_request_requires_value() {
        let mut data = config();
        data.attributes.remove("value");
        let err = RecordResource::request(&data).unwrap_err();
        assert!(matches!(err, ResourceError::MissingAttribute("value")));
    }

    #[test]
    fn test_import_state() {
        let data = RecordResource
            .import_state("023e105f4ecef8ad9ca31a8372d0c353/372e67954025e0ba6aaa6d586b9e0b59")
            .unwrap();
        assert_eq!(data.id(), "372e67954025e0ba6aaa6d586b9e0b59");
        assert_eq!(data.get_str("zone_id"), Some("023e105f4ecef8ad9ca31a8372d0c353"));
    }

    #[test]
    fn test_import_state_rejects_malformed_ids() {
        for id in ["372e67954025e0ba6aaa6d586b9e0b59", "/abc", "zone/", "a/b/c"] {
            let err = RecordResource.import_state(id).unwrap_err();
            assert!(matches!(err, ResourceError::InvalidImportId { .. }), "{id}");
        }
    }

    #[test]
    fn test_missing_record_detection() {
        assert!(is_missing_record(&CloudflareError::Api {
            status: 404,
            message: "Not Found".to_string(),
        }));
        assert!(is_missing_record(&CloudflareError::Api {
            status: 400,
            message: "Record does not exist. (81044)".to_string(),
        }));
        assert!(!is_missing_record(&CloudflareError::Api {
            status: 403,
            message: "Authentication error".to_string(),
        }));
    }
}
