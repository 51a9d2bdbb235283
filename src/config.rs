use crate::cloudflare::{CloudflareClient, Credentials};
use crate::error::TfcfError;

/// Provider-level settings: how to authenticate and where the API lives.
#[derive(Clone, Default)]
pub struct ProviderConfig {
    pub api_token: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub user_service_key: Option<String>,
    pub base_url: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

impl ProviderConfig {
    /// An API token wins over a global key; the key needs its email.
    pub fn credentials(&self) -> Result<Credentials, TfcfError> {
        if let Some(token) = non_empty(&self.api_token) {
            return Ok(Credentials::Token(token));
        }

        match (non_empty(&self.email), non_empty(&self.api_key)) {
            (Some(email), Some(key)) => Ok(Credentials::ApiKey { email, key }),
            (Some(_), None) => Err(TfcfError::Config(
                "CLOUDFLARE_EMAIL is set but CLOUDFLARE_API_KEY is missing".to_string(),
            )),
            (None, Some(_)) => Err(TfcfError::Config(
                "CLOUDFLARE_API_KEY is set but CLOUDFLARE_EMAIL is missing".to_string(),
            )),
            (None, None) => Err(TfcfError::Config(
                "No credentials provided. Set CLOUDFLARE_API_TOKEN, or CLOUDFLARE_API_KEY and CLOUDFLARE_EMAIL"
                    .to_string(),
            )),
        }
    }

    pub fn client(&self) -> Result<CloudflareClient, TfcfError> {
        let credentials = self.credentials()?;

        let client = match non_empty(&self.base_url) {
            Some(base_url) => CloudflareClient::with_base_url(credentials, base_url)?,
            None => CloudflareClient::new(credentials)?,
        };

        Ok(match non_empty(&self.user_service_key) {
            Some(key) => client.with_user_service_key(key),
            None => client,
        })
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProviderConfig")
            .field("api_token", &redacted(&self.api_token))
            .field("email", &self.email)
            .field("api_key", &redacted(&self.api_key))
            .field("user_service_key", &redacted(&self.user_service_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}
