use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder};

use super::CloudflareError;
use super::types::{
    DEFAULT_PAGE_SIZE, DnsRecord, DnsRecordRequest, OriginCaCertificate,
    OriginCaCertificateRequest, RevokedCertificate, Zone, ZoneInfo,
};

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const X_AUTH_EMAIL: &str = "x-auth-email";
const X_AUTH_KEY: &str = "x-auth-key";
const X_AUTH_USER_SERVICE_KEY: &str = "x-auth-user-service-key";

/// How requests authenticate against the API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Scoped API token, sent as a bearer token.
    Token(String),
    /// Legacy global API key paired with the account email.
    ApiKey { email: String, key: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
            Self::ApiKey { email, .. } => f
                .debug_struct("ApiKey")
                .field("email", email)
                .field("key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Authenticated handle to the Cloudflare v4 API.
///
/// Every resource operation receives one of these explicitly; nothing in the
/// crate keeps a global client.
#[derive(Clone)]
pub struct CloudflareClient {
    client: reqwest::Client,
    base_url: String,
    user_service_key: Option<String>,
}

impl CloudflareClient {
    pub fn new(credentials: Credentials) -> Result<Self, CloudflareError> {
        Self::with_base_url(credentials, CLOUDFLARE_API_BASE.to_string())
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_base_url(
        credentials: Credentials,
        base_url: String,
    ) -> Result<Self, CloudflareError> {
        Self::create_client(credentials, base_url)
    }

    /// Origin CA endpoints also accept the dedicated user service key.
    pub fn with_user_service_key(mut self, key: impl Into<String>) -> Self {
        self.user_service_key = Some(key.into());
        self
    }

    fn create_client(credentials: Credentials, base_url: String) -> Result<Self, CloudflareError> {
        let invalid = |what: &str| CloudflareError::Auth {
            message: format!("Invalid {} format", what),
        };

        let mut headers = HeaderMap::new();
        match &credentials {
            Credentials::Token(token) => {
                let auth_value = format!("Bearer {}", token);
                let value = HeaderValue::from_str(&auth_value).map_err(|_| invalid("token"))?;
                headers.insert(AUTHORIZATION, value);
            }
            Credentials::ApiKey { email, key } => {
                let email = HeaderValue::from_str(email).map_err(|_| invalid("email"))?;
                let key = HeaderValue::from_str(key).map_err(|_| invalid("API key"))?;
                headers.insert(HeaderName::from_static(X_AUTH_EMAIL), email);
                headers.insert(HeaderName::from_static(X_AUTH_KEY), key);
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(CloudflareError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_service_key: None,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    pub async fn verify_auth(&self) -> Result<(), CloudflareError> {
        let url = format!("{}/user/tokens/verify", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| CloudflareError::Api {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })?;

        if body.get("success").and_then(|v| v.as_bool()) == Some(true) {
            return Ok(());
        }

        let error_message = body
            .get("errors")
            .and_then(|e| e.as_array())
            .and_then(|arr| arr.first())
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown authentication error");

        Err(CloudflareError::Auth {
            message: error_message.to_string(),
        })
    }

    pub async fn lookup_zone_by_id(&self, zone_id: &str) -> Result<ZoneInfo, CloudflareError> {
        let url = format!("{}/zones/{}", self.base_url, zone_id);

        let body = match self.send(self.client.get(&url)).await {
            Ok(body) => body,
            Err(CloudflareError::Api { status, message }) => {
                if status == 404 || message.to_lowercase().contains("not found") {
                    return Err(CloudflareError::ZoneNotFound {
                        zone: zone_id.to_string(),
                    });
                }
                return Err(CloudflareError::ZoneLookupFailed { message });
            }
            Err(e) => return Err(e),
        };

        let zone: Zone = serde_json::from_value(body["result"].clone()).map_err(|e| {
            CloudflareError::ZoneLookupFailed {
                message: format!("Failed to parse zone: {}", e),
            }
        })?;

        Ok(zone.into())
    }

    pub async fn lookup_zone_by_name(&self, zone_name: &str) -> Result<ZoneInfo, CloudflareError> {
        let encoded_name = urlencoding::encode(zone_name);
        let url = format!("{}/zones?name={}", self.base_url, encoded_name);

        let body = self
            .send(self.client.get(&url))
            .await
            .map_err(|e| match e {
                CloudflareError::Api { message, .. } => {
                    CloudflareError::ZoneLookupFailed { message }
                }
                other => other,
            })?;

        let zones: Vec<Zone> = serde_json::from_value(body["result"].clone()).map_err(|e| {
            CloudflareError::ZoneLookupFailed {
                message: format!("Failed to parse zones: {}", e),
            }
        })?;

        zones
            .into_iter()
            .find(|zone| zone.name.eq_ignore_ascii_case(zone_name))
            .map(ZoneInfo::from)
            .ok_or_else(|| CloudflareError::ZoneNotFound {
                zone: zone_name.to_string(),
            })
    }

    pub async fn list_dns_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, CloudflareError> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);

        self.fetch_all_pages(&url, DEFAULT_PAGE_SIZE, |result| async move {
            serde_json::from_value::<Vec<DnsRecord>>(result)
                .map_err(|e| CloudflareError::decode("DNS records", e))
        })
        .await
    }

    pub async fn dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
    ) -> Result<DnsRecord, CloudflareError> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);
        let body = self.send(self.client.get(&url)).await?;
        decode_result(&body, "DNS record")
    }

    pub async fn create_dns_record(
        &self,
        zone_id: &str,
        record: &DnsRecordRequest,
    ) -> Result<DnsRecord, CloudflareError> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let body = self.send(self.client.post(&url).json(record)).await?;
        decode_result(&body, "DNS record")
    }

    pub async fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecordRequest,
    ) -> Result<DnsRecord, CloudflareError> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);
        let body = self.send(self.client.put(&url).json(record)).await?;
        decode_result(&body, "DNS record")
    }

    pub async fn delete_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
    ) -> Result<(), CloudflareError> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    pub async fn create_origin_ca_certificate(
        &self,
        request: &OriginCaCertificateRequest,
    ) -> Result<OriginCaCertificate, CloudflareError> {
        let url = format!("{}/certificates", self.base_url);
        let body = self
            .send(self.origin_ca(Method::POST, &url).json(request))
            .await?;
        decode_result(&body, "origin CA certificate")
    }

    pub async fn origin_ca_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<OriginCaCertificate, CloudflareError> {
        let url = format!("{}/certificates/{}", self.base_url, certificate_id);
        let body = self.send(self.origin_ca(Method::GET, &url)).await?;
        decode_result(&body, "origin CA certificate")
    }

    pub async fn revoke_origin_ca_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<RevokedCertificate, CloudflareError> {
        let url = format!("{}/certificates/{}", self.base_url, certificate_id);
        let body = self.send(self.origin_ca(Method::DELETE, &url)).await?;
        decode_result(&body, "revoked certificate")
    }

    fn origin_ca(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.user_service_key {
            Some(key) => request.header(X_AUTH_USER_SERVICE_KEY, key),
            None => request,
        }
    }

    pub async fn fetch_all_pages<T, F, Fut>(
        &self,
        base_url: &str,
        page_size: u32,
        parse_fn: F,
    ) -> Result<Vec<T>, CloudflareError>
    where
        F: Fn(serde_json::Value) -> Fut,
        Fut: std::future::Future<Output = Result<Vec<T>, CloudflareError>>,
    {
        let mut all_results = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!("{}?page={}&per_page={}", base_url, page, page_size);
            let body = self.send(self.client.get(&url)).await?;

            let page_results = parse_fn(body["result"].clone()).await?;
            let count = page_results.len();
            all_results.extend(page_results);

            let total_count = body
                .get("result_info")
                .and_then(|ri| ri.get("total_count"))
                .and_then(|tc| tc.as_u64())
                .unwrap_or(0);

            if is_last_page(page, page_size, total_count, count) {
                break;
            }

            page += 1;
        }

        Ok(all_results)
    }

    /// Sends the request and unwraps the response envelope, returning the whole body
    /// when `success` is true.
    async fn send(&self, request: RequestBuilder) -> Result<serde_json::Value, CloudflareError> {
        let request = request.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), "cloudflare request");

        let response = self.client.execute(request).await?;
        let status = response.status();

        let body: serde_json::Value = response.json().await.map_err(|e| CloudflareError::Api {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })?;

        let success = body
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !success {
            return Err(CloudflareError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }
}

fn is_last_page(page: u32, page_size: u32, total_count: u64, count: usize) -> bool {
    count == 0 || u64::from(page) * u64::from(page_size) >= total_count
}

fn error_message(body: &serde_json::Value) -> String {
    let messages: Vec<&str> = body
        .get("errors")
        .and_then(|e| e.as_array())
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        "Unknown error".to_string()
    } else {
        messages.join("; ")
    }
}

fn decode_result<T: serde::de::DeserializeOwned>(
    body: &serde_json::Value,
    what: &str,
) -> Result<T, CloudflareError> {
    serde_json::from_value(body["result"].clone()).map_err(|e| CloudflareError::decode(what, e))
}

impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("base_url", &self.base_url)
            .field("credentials", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(value: &str) -> Credentials {
        Credentials::Token(value.to_string())
    }

    #[test]
    fn test_client_creation() {
        let client = CloudflareClient::new(token("test_token"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_creation_with_api_key() {
        let client = CloudflareClient::new(Credentials::ApiKey {
            email: "ops@example.com".to_string(),
            key: "0123456789abcdef".to_string(),
        });
        assert!(client.is_ok());
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let result = CloudflareClient::new(token("bad\ntoken"));
        assert!(matches!(result, Err(CloudflareError::Auth { .. })));
    }

    #[test]
    fn test_debug_does_not_expose_token() {
        let client = CloudflareClient::new(token("super_secret_token_12345"))
            .unwrap()
            .with_user_service_key("v1.0-service-key-secret");
        let debug_output = format!("{:?}", client);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token_12345"));
        assert!(!debug_output.contains("v1.0-service-key-secret"));
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::ApiKey {
            email: "ops@example.com".to_string(),
            key: "global_key_secret".to_string(),
        };
        let debug_output = format!("{:?}", creds);
        assert!(debug_output.contains("ops@example.com"));
        assert!(!debug_output.contains("global_key_secret"));

        let debug_output = format!("{:?}", token("token_secret"));
        assert!(!debug_output.contains("token_secret"));
    }

    #[test]
    fn test_api_base_url() {
        let client = CloudflareClient::new(token("test_token")).unwrap();
        assert_eq!(client.api_base(), "https://api.cloudflare.com/client/v4");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            CloudflareClient::with_base_url(token("t"), "http://127.0.0.1:8080/".to_string())
                .unwrap();
        assert_eq!(client.api_base(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_error_message_joins_all_errors() {
        let body = serde_json::json!({
            "success": false,
            "errors": [
                { "code": 1000, "message": "first" },
                { "code": 1001, "message": "second" }
            ]
        });
        assert_eq!(error_message(&body), "first; second");
    }

    #[test]
    fn test_is_last_page() {
        assert!(!is_last_page(1, 100, 101, 100));
        assert!(is_last_page(2, 100, 101, 1));
        assert!(is_last_page(3, 100, 101, 0));
        assert!(is_last_page(1, 100, 0, 0));
    }

    #[test]
    fn test_is_last_page_with_total_beyond_u32() {
        let total_count = u64::from(u32::MAX) + 2;
        assert!(!is_last_page(1, 100, total_count, 100));
        assert!(!is_last_page(u32::MAX / 100, 100, total_count, 100));
    }

    #[test]
    fn test_error_message_without_errors() {
        let body = serde_json::json!({ "success": false });
        assert_eq!(error_message(&body), "Unknown error");
    }
}
