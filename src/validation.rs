//! Attribute validators used by resource schemas.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::FromDer;

/// A single problem with one attribute, rendered as `"key": message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key:?}: {message}")]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Every problem found in one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

type ValidateFn = dyn Fn(&str, &Value) -> Result<(), ValidationError> + Send + Sync;

#[derive(Clone)]
pub struct Validator {
    name: &'static str,
    check: Arc<ValidateFn>,
}

impl Validator {
    pub fn new<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Self {
            name,
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn validate(&self, key: &str, value: &Value) -> Result<(), ValidationError> {
        (self.check)(key, value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

pub fn string_in_slice(valid: &'static [&'static str], ignore_case: bool) -> Validator {
    Validator::new("string_in_slice", move |key, value| {
        let Some(s) = value.as_str() else {
            return Err(ValidationError::new(key, "expected type string"));
        };
        let found = valid.iter().any(|v| {
            if ignore_case {
                v.eq_ignore_ascii_case(s)
            } else {
                *v == s
            }
        });
        if found {
            Ok(())
        } else {
            Err(ValidationError::new(
                key,
                format!("expected to be one of {:?}, got {:?}", valid, s),
            ))
        }
    })
}

pub fn int_in_slice(valid: &'static [i64]) -> Validator {
    Validator::new("int_in_slice", move |key, value| {
        let Some(n) = value.as_i64() else {
            return Err(ValidationError::new(key, "expected type int"));
        };
        if valid.contains(&n) {
            Ok(())
        } else {
            Err(ValidationError::new(
                key,
                format!("expected to be one of {:?}, got {}", valid, n),
            ))
        }
    })
}

pub fn csr() -> Validator {
    Validator::new("csr", |key, value| match value.as_str() {
        Some(pem) => validate_csr(key, pem),
        None => Err(ValidationError::new(key, "expected type string")),
    })
}

/// Checks that `input` is PEM and that its payload is a PKCS#10 certification request.
pub fn validate_csr(key: &str, input: &str) -> Result<(), ValidationError> {
    let (_, pem) = parse_x509_pem(input.as_bytes())
        .map_err(|_| ValidationError::new(key, "invalid PEM data"))?;

    X509CertificationRequest::from_der(&pem.contents).map_err(|e| {
        ValidationError::new(key, format!("invalid certificate request: {}", e))
    })?;

    Ok(())
}
