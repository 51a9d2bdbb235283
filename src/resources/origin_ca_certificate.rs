use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::cloudflare::{CloudflareClient, CloudflareError, OriginCaCertificateRequest};
use crate::resource::{Resource, ResourceData, ResourceError};
use crate::schema::{Attribute, Schema};
use crate::validation::{self, int_in_slice, string_in_slice};

pub const RESOURCE_TYPE: &str = "cloudflare_origin_ca_certificate";

pub const REQUEST_TYPES: &[&str] = &["origin-rsa", "origin-ecc", "keyless-certificate"];

/// Validity periods, in days, that the API will issue.
pub const VALIDITY_DAYS: &[i64] = &[7, 30, 90, 365, 730, 1095, 5475];

/// Error text the API returns for an id it has no certificate for.
const CERTIFICATE_MISSING: &str = "Failed to read certificate from Database";

/// Certificates cannot be modified; every configurable attribute forces a new one.
pub struct OriginCaCertificateResource;

fn is_missing_certificate(err: &CloudflareError) -> bool {
    err.to_string().contains(CERTIFICATE_MISSING)
}

fn format_expiry(expires_on: Option<DateTime<Utc>>) -> String {
    expires_on
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[async_trait]
impl Resource for OriginCaCertificateResource {
    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> Schema {
        Schema::new(0)
            .attribute(
                "certificate",
                Attribute::string()
                    .computed()
                    .description("Issued certificate, PEM encoded"),
            )
            .attribute(
                "csr",
                Attribute::string()
                    .required()
                    .force_new()
                    .validator(validation::csr())
                    .description("PEM encoded PKCS#10 certificate signing request"),
            )
            .attribute(
                "expires_on",
                Attribute::string()
                    .computed()
                    .description("Expiry as an RFC 3339 timestamp"),
            )
            .attribute("hostnames", Attribute::string_set().required().force_new())
            .attribute(
                "request_type",
                Attribute::string()
                    .required()
                    .force_new()
                    .validator(string_in_slice(REQUEST_TYPES, false)),
            )
            .attribute(
                "requested_validity",
                Attribute::int()
                    .optional()
                    .force_new()
                    .validator(int_in_slice(VALIDITY_DAYS))
                    .description("Validity period in days"),
            )
    }

    async fn create(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let csr = data
            .get_str("csr")
            .ok_or(ResourceError::MissingAttribute("csr"))?
            .to_string();
        validation::validate_csr("csr", &csr).map_err(|e| ResourceError::Validation(e.into()))?;

        let request_type = data
            .get_str("request_type")
            .ok_or(ResourceError::MissingAttribute("request_type"))?
            .to_string();
        let hostnames: Vec<String> = data.get_string_set("hostnames").into_iter().collect();

        let requested_validity = data
            .get_int("requested_validity")
            .map(|days| {
                u32::try_from(days).map_err(|_| ResourceError::InvalidAttribute {
                    key: "requested_validity",
                    value: days.to_string(),
                })
            })
            .transpose()?;

        tracing::info!(hostnames = ?hostnames, "creating origin CA certificate");

        let request = OriginCaCertificateRequest {
            csr,
            hostnames,
            request_type,
            requested_validity,
        };

        let cert = client
            .create_origin_ca_certificate(&request)
            .await
            .map_err(ResourceError::api("error creating origin certificate"))?;

        data.set_id(cert.id);
        data.set("certificate", cert.certificate);
        data.set("expires_on", format_expiry(cert.expires_on));
        Ok(())
    }

    async fn read(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let certificate_id = data.id().to_string();

        let cert = match client.origin_ca_certificate(&certificate_id).await {
            Ok(cert) => cert,
            Err(e) if is_missing_certificate(&e) => {
                tracing::info!(certificate_id = %certificate_id, "origin CA certificate does not exist");
                data.clear_id();
                return Ok(());
            }
            Err(e) => {
                return Err(ResourceError::api(format!(
                    "error finding origin CA certificate {:?}",
                    certificate_id
                ))(e));
            }
        };

        tracing::debug!(certificate = ?cert, "origin CA certificate");

        if cert.is_revoked() {
            tracing::info!(certificate_id = %certificate_id, "origin CA certificate has been revoked");
            data.clear_id();
            return Ok(());
        }

        data.set("certificate", cert.certificate);
        data.set("expires_on", format_expiry(cert.expires_on));
        data.set_string_set("hostnames", cert.hostnames);
        data.set("request_type", cert.request_type);
        Ok(())
    }

    async fn delete(
        &self,
        data: &mut ResourceData,
        client: &CloudflareClient,
    ) -> Result<(), ResourceError> {
        let certificate_id = data.id().to_string();

        tracing::info!(certificate_id = %certificate_id, "revoking origin CA certificate");

        client
            .revoke_origin_ca_certificate(&certificate_id)
            .await
            .map_err(ResourceError::api("error revoking origin CA certificate"))?;

        data.clear_id();
        Ok(())
    }
}
