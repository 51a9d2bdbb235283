//! tfcf - Cloudflare DNS record and Origin CA certificate resources
//!
//! Resource schemas, lifecycle operations and state migration for managing
//! Cloudflare objects the way a Terraform provider does.

pub mod cloudflare;
pub mod config;
pub mod error;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod terraform;
pub mod validation;

pub use cloudflare::{CloudflareClient, CloudflareError, Credentials, ZoneInfo};
pub use config::ProviderConfig;
pub use error::TfcfError;
pub use resource::{Resource, ResourceData, ResourceError};
pub use schema::Schema;
pub use terraform::state::InstanceState;
