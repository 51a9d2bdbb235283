use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::cloudflare::{CloudflareClient, CloudflareError};
use crate::schema::Schema;
use crate::terraform::state::InstanceState;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("invalid value {value:?} for attribute '{key}'")]
    InvalidAttribute { key: &'static str, value: String },

    #[error("zone not found: '{zone}'")]
    ZoneNotFound { zone: String },

    #[error("no DNS record matches {name} ({record_type})")]
    RecordNotFound { name: String, record_type: String },

    #[error("{candidates} DNS records match {name} ({record_type}); cannot pick one")]
    AmbiguousRecord {
        name: String,
        record_type: String,
        candidates: usize,
    },

    #[error("{context}: {source}")]
    Api {
        context: String,
        #[source]
        source: CloudflareError,
    },

    #[error("{0} does not support in-place updates")]
    UpdateNotSupported(&'static str),

    #[error("invalid import id {id:?}, expected {expected}")]
    InvalidImportId { id: String, expected: &'static str },

    #[error("unknown resource type: {0}")]
    UnknownResource(String),
}

impl ResourceError {
    /// Wraps an upstream API error with what the resource was doing at the time.
    pub fn api(context: impl Into<String>) -> impl FnOnce(CloudflareError) -> Self {
        let context = context.into();
        move |source| Self::Api { context, source }
    }
}

/// Attribute values of one resource instance, typed per its schema.
///
/// An empty `id` marks an instance that no longer exists remotely and should be
/// dropped from state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }

    /// Explicit nulls read as unset.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// Empty strings read as unset.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_string_set(&self, key: &str) -> BTreeSet<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Stores the values sorted and deduplicated.
    pub fn set_string_set<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        self.set(key, Value::from(set.into_iter().collect::<Vec<_>>()));
    }
}

/// Lifecycle of one managed resource type.
///
/// The API client is handed to every call; resources hold no connection state
/// of their own.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError>;

    /// Refreshes `data` from the API. Clears the id when the remote object is gone.
    async fn read(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError>;

    async fn update(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let _ = (data, client);
        Err(ResourceError::UpdateNotSupported(self.type_name()))
    }

    async fn delete(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError>;

    /// Passthrough import: the given id becomes the state id, a read fills the rest.
    fn import_state(&self, id: &str) -> Result<ResourceData, ResourceError> {
        Ok(ResourceData::with_id(id))
    }

    async fn upgrade_state(
        &self,
        version: u32,
        state: InstanceState,
        client: &CloudflareClient,
    ) -> Result<InstanceState, ResourceError> {
        let _ = (version, client);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_data_serialization() {
        let mut data = ResourceData::with_id("abc123");
        data.set("zone_id", "zone456");
        data.set("ttl", 120);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "abc123",
                "attributes": { "zone_id": "zone456", "ttl": 120 }
            })
        );
    }

    #[test]
    fn test_resource_data_deserialization_defaults() {
        let data: ResourceData =
            serde_json::from_str(r#"{"attributes": {"csr": "pem"}}"#).unwrap();
        assert_eq!(data.id(), "");
        assert!(!data.exists());
        assert_eq!(data.get_str("csr"), Some("pem"));
    }

    #[test]
    fn test_resource_data_roundtrip() {
        let mut data = ResourceData::with_id("cert1");
        data.set_string_set("hostnames", ["example.com"]);
        let json = serde_json::to_string(&data).unwrap();
        let back: ResourceData = serde_json::from_str(&json).unwrap();
        assert_eq!(data, back);
    }

    #[test]
    fn test_typed_getters() {
        let mut data = ResourceData::new();
        data.set("name", "www");
        data.set("empty", "");
        data.set("ttl", 300);
        data.set("proxied", true);
        data.set("nothing", Value::Null);

        assert_eq!(data.get_str("name"), Some("www"));
        assert_eq!(data.get_str("empty"), None);
        assert_eq!(data.get_int("ttl"), Some(300));
        assert_eq!(data.get_bool("proxied"), Some(true));
        assert_eq!(data.get_str("ttl"), None);
        assert!(data.get("nothing").is_none());
        assert!(data.get("missing").is_none());
    }

    #[test]
    fn test_string_set_is_sorted_and_deduplicated() {
        let mut data = ResourceData::new();
        data.set_string_set("hostnames", ["b.example.com", "a.example.com", "b.example.com"]);

        assert_eq!(
            data.get("hostnames"),
            Some(&json!(["a.example.com", "b.example.com"]))
        );
        assert_eq!(data.get_string_set("hostnames").len(), 2);
        assert!(data.get_string_set("missing").is_empty());
    }

    #[test]
    fn test_clear_id() {
        let mut data = ResourceData::with_id("abc");
        assert!(data.exists());
        data.clear_id();
        assert!(!data.exists());
    }

    #[test]
    fn test_api_error_context() {
        let err = ResourceError::api("error creating origin certificate")(CloudflareError::Api {
            status: 400,
            message: "bad csr".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "error creating origin certificate: API error (400): bad csr"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_ambiguous_record_display() {
        let err = ResourceError::AmbiguousRecord {
            name: "www.example.com".to_string(),
            record_type: "A".to_string(),
            candidates: 2,
        };
        assert_eq!(
            err.to_string(),
            "2 DNS records match www.example.com (A); cannot pick one"
        );
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: ResourceError =
            ValidationErrors::from(crate::validation::ValidationError::new("csr", "invalid PEM data"))
                .into();
        assert_eq!(
            err.to_string(),
            "invalid configuration: \"csr\": invalid PEM data"
        );
    }
}
