mod client;
mod error;
mod types;

pub use client::{CloudflareClient, Credentials};
pub use error::CloudflareError;
pub use types::{
    DnsRecord, DnsRecordRequest, OriginCaCertificate, OriginCaCertificateRequest,
    RevokedCertificate, ZoneInfo, is_record_id,
};
