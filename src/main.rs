mod cli;
mod output;

use std::io::Read;
use std::path::Path;

use clap::Parser;
use color_eyre::eyre::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use tfcf::resources::{self, get_resource};
use tfcf::validation::{self, ValidationErrors};
use tfcf::{InstanceState, ProviderConfig, ResourceData, TfcfError};

/// Reads JSON state from a file, or from stdin when the path is `-`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, TfcfError> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), TfcfError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), TfcfError> {
    let config = ProviderConfig::from(cli.provider);

    match cli.command {
        Command::Resources => {
            let all = resources::resource_types()
                .into_iter()
                .map(get_resource)
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", output::render_resource_tree(&all));
        }
        Command::Schema { resource, json } => {
            let schema = get_resource(&resource)?.schema();
            if json {
                print_json(&schema)?;
            } else {
                println!("{}", output::render_schema_table(&schema));
            }
        }
        Command::ValidateCsr { file } => {
            let pem = std::fs::read_to_string(&file)?;
            validation::validate_csr("csr", &pem).map_err(ValidationErrors::from)?;
            println!("{}: valid certificate signing request", file.display());
        }
        Command::Verify => {
            config.client()?.verify_auth().await?;
            println!("credentials are valid");
        }
        Command::Create(args) => {
            let resource = get_resource(&args.resource)?;
            let mut data: ResourceData = read_json(&args.state)?;
            resource.schema().validate(&data)?;

            let client = config.client()?;
            resource.create(&mut data, &client).await?;
            tracing::info!(resource = %args.resource, id = %data.id(), "created");
            print_json(&data)?;
        }
        Command::Read(args) => {
            let resource = get_resource(&args.resource)?;
            let mut data: ResourceData = read_json(&args.state)?;
            if !data.exists() {
                return Err(TfcfError::MissingId(args.resource));
            }

            let client = config.client()?;
            resource.read(&mut data, &client).await?;
            if !data.exists() {
                tracing::warn!(resource = %args.resource, "object no longer exists");
            }
            print_json(&data)?;
        }
        Command::Update(args) => {
            let resource = get_resource(&args.target.resource)?;
            let schema = resource.schema();
            let mut data: ResourceData = read_json(&args.target.state)?;
            schema.validate(&data)?;

            if let Some(prior) = &args.prior {
                let prior: ResourceData = read_json(prior)?;
                let replaced = schema.replacement_attributes(&prior, &data);
                if !replaced.is_empty() {
                    return Err(TfcfError::ReplacementRequired {
                        resource: args.target.resource,
                        attributes: replaced.into_iter().map(str::to_string).collect(),
                    });
                }
            }

            let client = config.client()?;
            resource.update(&mut data, &client).await?;
            print_json(&data)?;
        }
        Command::Delete(args) => {
            let resource = get_resource(&args.resource)?;
            let mut data: ResourceData = read_json(&args.state)?;

            let client = config.client()?;
            resource.delete(&mut data, &client).await?;
            tracing::info!(resource = %args.resource, "deleted");
            print_json(&data)?;
        }
        Command::Import { resource, id } => {
            let handler = get_resource(&resource)?;
            let mut data = handler.import_state(&id)?;

            let client = config.client()?;
            handler.read(&mut data, &client).await?;
            if !data.exists() {
                return Err(TfcfError::ImportNotFound { resource, id });
            }
            print_json(&data)?;
        }
        Command::Migrate(args) => {
            let resource = get_resource(&args.resource)?;
            let state: InstanceState = read_json(&args.state)?;

            let client = config.client()?;
            let upgraded = resource
                .upgrade_state(args.schema_version, state, &client)
                .await?;
            print_json(&upgraded)?;
        }
    }

    Ok(())
}
