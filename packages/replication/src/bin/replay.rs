use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use deckhand_common::{Config, DocumentSnapshot};
use deckhand_replication::{DeferredInitializer, YrsReplica};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_dir = std::env::current_dir()?;
    let mut snapshot_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config-dir" | "-c" => {
                if i + 1 < args.len() {
                    config_dir = PathBuf::from(&args[i + 1]);
                    i += 2;
                } else {
                    eprintln!("--config-dir requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Usage: deckhand-replay [OPTIONS] <SNAPSHOT_JSON>");
                println!();
                println!("Options:");
                println!("  -c, --config-dir <DIR>  Directory holding deckhand.config.json (default: current dir)");
                println!("  -h, --help              Show this help message");
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                snapshot_path = Some(PathBuf::from(arg));
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    let Some(snapshot_path) = snapshot_path else {
        eprintln!("Missing <SNAPSHOT_JSON>, see --help");
        std::process::exit(1);
    };

    let config = Config::load(&config_dir)
        .with_context(|| format!("Failed to load config from {}", config_dir.display()))?;

    let content = std::fs::read_to_string(&snapshot_path)
        .with_context(|| format!("Failed to read {}", snapshot_path.display()))?;
    let snapshot: DocumentSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", snapshot_path.display()))?;

    let replica = Arc::new(YrsReplica::new());
    let initializer = DeferredInitializer::with_config(replica.clone(), config.replication);

    let handle = initializer.start(snapshot);
    let report = handle.wait().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("Encoded document: {} bytes", replica.encode_state().len());

    Ok(())
}
