use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Legacy flat instance state: the resource id plus string-encoded attributes.
///
/// Only the state upgrader reads this shape; current state lives in
/// [`crate::resource::ResourceData`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl InstanceState {
    pub fn new<I, K, V>(id: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id: id.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Empty strings read as unset, matching how the legacy format stored absent values.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Updates both the instance id and the mirrored `id` attribute.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.attributes.insert("id".to_string(), self.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_legacy_state() {
        let json = r#"{
            "id": "123456",
            "attributes": {
                "id": "123456",
                "name": "notthesub",
                "ttl": "120"
            }
        }"#;

        let state: InstanceState = serde_json::from_str(json).unwrap();
        assert_eq!(state.id, "123456");
        assert_eq!(state.attribute("name"), Some("notthesub"));
        assert_eq!(state.attribute("ttl"), Some("120"));
        assert_eq!(state.attribute("proxied"), None);
    }

    #[test]
    fn test_empty_attribute_reads_as_unset() {
        let state = InstanceState::new("1", [("priority", "")]);
        assert_eq!(state.attribute("priority"), None);
    }

    #[test]
    fn test_set_id_updates_attribute() {
        let mut state = InstanceState::new("123456", [("id", "123456")]);
        state.set_id("7778f8766e583af8de0abfcd76c5dAAA");
        assert_eq!(state.id, "7778f8766e583af8de0abfcd76c5dAAA");
        assert_eq!(
            state.attribute("id"),
            Some("7778f8766e583af8de0abfcd76c5dAAA")
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(InstanceState::default().is_empty());
        assert!(!InstanceState::new("abc", Vec::<(String, String)>::new()).is_empty());
    }
}
