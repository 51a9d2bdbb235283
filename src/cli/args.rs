use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tfcf::ProviderConfig;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args)]
pub struct ProviderArgs {
    #[arg(long, global = true, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    #[arg(long, global = true, env = "CLOUDFLARE_EMAIL")]
    pub email: Option<String>,

    #[arg(long, global = true, env = "CLOUDFLARE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Origin CA key, sent as X-Auth-User-Service-Key on certificate calls
    #[arg(
        long,
        global = true,
        env = "CLOUDFLARE_API_USER_SERVICE_KEY",
        hide_env_values = true
    )]
    pub user_service_key: Option<String>,

    #[arg(long, global = true, env = "CLOUDFLARE_API_BASE_URL")]
    pub base_url: Option<String>,
}

impl From<ProviderArgs> for ProviderConfig {
    fn from(args: ProviderArgs) -> Self {
        ProviderConfig {
            api_token: args.api_token,
            email: args.email,
            api_key: args.api_key,
            user_service_key: args.user_service_key,
            base_url: args.base_url,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List supported resources and their attributes
    Resources,
    /// Print a resource schema
    Schema {
        resource: String,
        #[arg(long)]
        json: bool,
    },
    /// Check that a file holds a PEM certificate signing request
    ValidateCsr { file: PathBuf },
    /// Verify the configured credentials against the API
    Verify,
    Create(StateArgs),
    Read(StateArgs),
    Update(UpdateArgs),
    Delete(StateArgs),
    /// Build state for an existing object and refresh it
    Import { resource: String, id: String },
    /// Upgrade stored state to the current schema version
    Migrate(MigrateArgs),
}

#[derive(clap::Args, Debug)]
pub struct StateArgs {
    pub resource: String,

    /// State JSON file; `-` reads stdin
    #[arg(long, default_value = "-")]
    pub state: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: StateArgs,

    /// Last applied state; attributes that changed and force a new object abort the update
    #[arg(long)]
    pub prior: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct MigrateArgs {
    pub resource: String,

    /// Flat attribute state JSON file; `-` reads stdin
    #[arg(long, default_value = "-")]
    pub state: PathBuf,

    /// Schema version the stored state was written with
    #[arg(long, default_value_t = 0)]
    pub schema_version: u32,
}
