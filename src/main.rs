use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use widgetbot_core::config;
use widgetbot_core::service::InstanceService;
use widgetbot_core::settings::{
    default_settings, get_section_schema, validate_document, validate_section,
};
use widgetbot_core::store::open_store;

#[derive(Parser)]
#[command(
    name = "widgetbot",
    about = "widgetbot - Instance settings service for embeddable AI chat widgets",
    version = widgetbot_core::VERSION,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Start the HTTP API server
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the settings JSON schema
    Schema {
        /// Only this section
        section: Option<String>,
    },
    /// Print the default settings document
    Defaults,
    /// Validate a settings JSON file
    Validate {
        /// Path to the JSON file
        file: PathBuf,
        /// Validate the file as a single section
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Migrate every stored instance to the current settings layout
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("widgetbot=info".parse()?)
                .add_directive("widgetbot_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cmd_init()?,
        Commands::Serve { host, port } => cmd_serve(host, port).await?,
        Commands::Schema { section } => cmd_schema(section)?,
        Commands::Defaults => cmd_defaults()?,
        Commands::Validate { file, section } => {
            if !cmd_validate(&file, section.as_deref())? {
                std::process::exit(1);
            }
        }
        Commands::Migrate => cmd_migrate().await?,
    }

    Ok(())
}

fn cmd_init() -> Result<()> {
    let config_path = config::get_config_path();
    if !config::init_config(Some(&config_path))? {
        println!("Config already exists at {}", config_path.display());
        println!("Delete it first to re-initialize.");
        return Ok(());
    }
    println!("Created config at {}", config_path.display());
    Ok(())
}

#[cfg(feature = "http-api")]
async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    use std::sync::Arc;
    use widgetbot_core::service::http::{serve, AppState};

    let mut cfg = config::load_config_from_env();
    if let Some(host) = host {
        cfg.server.host = host;
    }
    if let Some(port) = port {
        cfg.server.port = port;
    }

    let store = open_store(&cfg)?;
    let addr = cfg.bind_addr();
    let state = Arc::new(AppState::new(cfg, InstanceService::new(store)));

    println!("Starting widgetbot HTTP API on {}...", addr);
    serve(&addr, state).await
}

#[cfg(not(feature = "http-api"))]
async fn cmd_serve(_host: Option<String>, _port: Option<u16>) -> Result<()> {
    anyhow::bail!("widgetbot was built without the http-api feature")
}

fn cmd_schema(section: Option<String>) -> Result<()> {
    let schema = get_section_schema(section.as_deref());
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn cmd_defaults() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&default_settings())?);
    Ok(())
}

/// Print every validation error; returns whether the file is valid.
fn cmd_validate(file: &Path, section: Option<&str>) -> Result<bool> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let errors = match section {
        Some(name) => validate_section(name, &payload),
        None => validate_document(&payload),
    };

    if errors.is_empty() {
        println!("✓ {} is valid", file.display());
        return Ok(true);
    }
    for error in &errors {
        eprintln!("✗ {}", error);
    }
    Ok(false)
}

async fn cmd_migrate() -> Result<()> {
    let cfg = config::load_config_from_env();
    let service = InstanceService::new(open_store(&cfg)?);
    let count = service.migrate_all().await?;
    println!("Migrated {} instances", count);
    Ok(())
}
