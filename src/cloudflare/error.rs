use thiserror::Error;

/// Cloudflare-specific errors that can occur during API operations.
///
/// SECURITY: Error messages must NEVER contain credentials (token, API key or service key).
#[derive(Debug, Error)]
pub enum CloudflareError {
    /// Authentication failed (invalid or expired credentials)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Zone not found (no zone with given name/ID exists or not accessible)
    #[error("zone not found: '{zone}'")]
    ZoneNotFound { zone: String },

    /// Zone lookup failed due to API error
    #[error("zone lookup failed: {message}")]
    ZoneLookupFailed { message: String },

    /// A successful response whose `result` did not have the expected shape
    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },
}

impl CloudflareError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } if *status != 0 => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn decode(what: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.to_string(),
            message: err.to_string(),
        }
    }
}
