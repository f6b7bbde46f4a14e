use crate::config::SwaggerConfig;
use crate::openapi_builder::component_definition;
use crate::schema_generator::{definitions, SourceSchemaGenerator, TypeSchemaGenerator};
use crate::serializer::write_to_file;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Router OpenAPI - Inspect and maintain the documents generated for a router
#[derive(Parser, Debug)]
#[command(name = "router-openapi")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the component schemas generated from the configured folders
    Schemas {
        /// Swagger configuration file (.json, .yaml or .yml)
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config: PathBuf,

        /// Output format (yaml or json)
        #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
        output_format: OutputFormat,

        /// Output file path (if not specified, outputs to stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output_path: Option<PathBuf>,
    },
    /// Delete the cached document so the next start regenerates it
    Clean {
        /// Swagger configuration file (.json, .yaml or .yml)
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config: PathBuf,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Run the selected subcommand
pub fn run(args: CliArgs) -> Result<()> {
    debug!("Parsed arguments: {:?}", args);

    match args.command {
        Command::Schemas {
            config,
            output_format,
            output_path,
        } => {
            let config = load_config(&config)?;
            let schemas = component_schemas(&config)?;

            let content = match output_format {
                OutputFormat::Yaml => serde_yaml::to_string(&schemas)
                    .context("Failed to serialize schemas to YAML")?,
                OutputFormat::Json => serde_json::to_string_pretty(&schemas)
                    .context("Failed to serialize schemas to JSON")?,
            };

            if let Some(output_path) = &output_path {
                write_to_file(&content, output_path)
                    .with_context(|| format!("Failed to write {}", output_path.display()))?;
                info!("Wrote {} schemas to {}", schemas.len(), output_path.display());
            } else {
                println!("{}", content);
            }
        }
        Command::Clean { config } => {
            let config = load_config(&config)?;
            clean(&config)?;
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<SwaggerConfig> {
    if !path.exists() {
        anyhow::bail!("Configuration file does not exist: {}", path.display());
    }
    info!("Configuration: {}", path.display());
    SwaggerConfig::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// The `components.schemas` of every configured folder, later folders overwriting earlier
/// ones
pub fn component_schemas(config: &SwaggerConfig) -> Result<IndexMap<String, Value>> {
    let mut schemas = IndexMap::new();

    for folder in &config.folders {
        info!("Generating schemas for {}", folder.display());
        let generated = SourceSchemaGenerator
            .create_schema(folder)
            .with_context(|| format!("Failed to generate schemas for {}", folder.display()))?;
        for (name, definition) in definitions(&generated)? {
            schemas.insert(name.clone(), component_definition(definition));
        }
    }

    Ok(schemas)
}

/// Remove the cached document; a missing file is not an error
pub fn clean(config: &SwaggerConfig) -> Result<bool> {
    let path = &config.json_path;
    if !path.exists() {
        info!("No cached document at {}", path.display());
        return Ok(false);
    }

    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    info!("Removed cached document {}", path.display());
    Ok(true)
}
