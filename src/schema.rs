//! Resource schema declarations: attribute types, flags and validators.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::resource::ResourceData;
use crate::validation::{ValidationError, ValidationErrors, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Bool,
    StringSet,
}

impl AttributeType {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::StringSet => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::StringSet => "set(string)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub case_insensitive: bool,
    pub description: &'static str,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "validator_name"
    )]
    pub validator: Option<Validator>,
}

fn validator_name<S: Serializer>(
    validator: &Option<Validator>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match validator {
        Some(validator) => serializer.serialize_str(validator.name()),
        None => serializer.serialize_none(),
    }
}

impl Attribute {
    pub fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            case_insensitive: false,
            description: "",
            validator: None,
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    pub fn int() -> Self {
        Self::new(AttributeType::Int)
    }

    pub fn bool() -> Self {
        Self::new(AttributeType::Bool)
    }

    pub fn string_set() -> Self {
        Self::new(AttributeType::StringSet)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Changing the attribute replaces the remote object instead of updating it.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Values differing only in ASCII case are the same value when planning changes.
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    fn check(&self, key: &str, value: Option<&Value>) -> Result<(), ValidationError> {
        let Some(value) = value else {
            if self.required {
                return Err(ValidationError::new(key, "required field is not set"));
            }
            return Ok(());
        };

        if !self.kind.accepts(value) {
            return Err(ValidationError::new(
                key,
                format!("expected type {}", self.kind),
            ));
        }

        match &self.validator {
            Some(validator) => validator.validate(key, value),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub version: u32,
    pub attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    /// Reports every problem in `data`, not just the first.
    pub fn validate(&self, data: &ResourceData) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        for key in data.attributes.keys() {
            if key != "id" && !self.attributes.contains_key(key.as_str()) {
                errors.push(ValidationError::new(key.as_str(), "unsupported attribute"));
            }
        }

        for (name, attribute) in &self.attributes {
            if let Err(e) = attribute.check(name, data.get(name)) {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Force-new attributes whose value differs between `prior` and `planned`.
    pub fn replacement_attributes(
        &self,
        prior: &ResourceData,
        planned: &ResourceData,
    ) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.force_new)
            .filter(|(name, attribute)| match attribute.kind {
                AttributeType::StringSet => {
                    prior.get_string_set(name) != planned.get_string_set(name)
                }
                AttributeType::String if attribute.case_insensitive => {
                    match (prior.get_str(name), planned.get_str(name)) {
                        (Some(before), Some(after)) => !before.eq_ignore_ascii_case(after),
                        (before, after) => before != after,
                    }
                }
                _ => prior.get(name) != planned.get(name),
            })
            .map(|(name, _)| *name)
            .collect()
    }
}
