//! Desktop CLI for exercising the bridge without a device
//!
//! Usage:
//! ```bash
//! cargo run --features cli --bin mnn-cli -- --asset-dir ./assets extract
//! cargo run --features cli --bin mnn-cli -- reverse Hello
//! cargo run --features cli --bin mnn-cli -- call '{"operation":"addNumbers","args":[10,20]}'
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mnn_core::assets::{AssetProvisioner, DirAssetSource};
use mnn_core::bridge::{call_async, BridgeCall, BridgeValue, NativeBridge};
use mnn_core::config::CoreConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mnn-cli")]
#[command(about = "Model provisioning and native bridge test tool")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding bundled assets
    #[arg(long, global = true)]
    asset_dir: Option<PathBuf>,

    /// Cache directory models are extracted into
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the native module responds
    Ping,
    /// Reverse a string
    Reverse { text: String },
    /// Add two numbers
    Add {
        #[arg(allow_negative_numbers = true)]
        a: f64,
        #[arg(allow_negative_numbers = true)]
        b: f64,
    },
    /// Extract the bundled model into the cache directory
    Extract,
    /// Report whether the model is already extracted
    Ready,
    /// Extract the model, initialize the detector and run it on an image
    Detect { image: PathBuf },
    /// Issue a raw call, e.g. '{"operation":"reverseString","args":["abc"]}'
    Call { json: String },
}

fn load_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CoreConfig::default(),
    };

    if cli.asset_dir.is_some() {
        config.asset_dir = cli.asset_dir.clone();
    }
    if cli.cache_dir.is_some() {
        config.cache_dir = cli.cache_dir.clone();
    }
    Ok(config)
}

fn provisioner(config: &CoreConfig) -> AssetProvisioner<DirAssetSource> {
    let asset_dir = config.asset_dir.clone().unwrap_or_else(|| PathBuf::from("assets"));
    AssetProvisioner::from_config(DirAssetSource::new(asset_dir), config)
}

fn print_value(value: &BridgeValue) {
    match value {
        BridgeValue::Text(text) => println!("{text}"),
        BridgeValue::Number(n) => println!("{n}"),
        BridgeValue::Null => println!("null"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let bridge = Arc::new(NativeBridge::with_default_backend());

    let call = match &cli.command {
        Command::Ping => BridgeCall::test_call(),
        Command::Reverse { text } => BridgeCall::reverse_text(text.as_str()),
        Command::Add { a, b } => BridgeCall::add_numbers(*a, *b),
        Command::Call { json } => serde_json::from_str(json).context("Invalid call JSON")?,
        Command::Ready => {
            let ready = provisioner(&config).is_ready(&config.model_name);
            println!("{ready}");
            return Ok(());
        }
        Command::Extract => {
            let asset = provisioner(&config).ensure_available(&config.model_name)?;
            println!("{}", asset.path_string());
            return Ok(());
        }
        Command::Detect { image } => {
            let path = bridge.provision_model(&provisioner(&config), &config.model_name);
            if path.is_empty() {
                bail!("Model {} could not be provisioned", config.model_name);
            }
            let status = call_async(bridge.clone(), BridgeCall::init_detector()).await?;
            print_value(&status);
            BridgeCall::detect_face(image.to_string_lossy())
        }
    };

    let value = call_async(bridge, call).await?;
    print_value(&value);
    Ok(())
}
