//! mediadrop CLI
//!
//! Runs the HTTP service, or a single retrieval from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mediadrop::{
    config,
    error::Result,
    models::{EngineKind, RetrievalRequest},
    server,
    services::{Retriever, YtDlpExtractor},
    storage::LocalStorage,
    utils::log as report,
};

/// mediadrop - media retrieval service
#[derive(Parser, Debug)]
#[command(
    name = "mediadrop",
    version,
    about = "Download remote media and serve the stored files"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "mediadrop.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage root (overrides config)
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },

    /// Retrieve one URL into the storage root
    Fetch {
        /// Source page or media URL
        url: String,
    },

    /// Validate configuration and check the extraction engine
    Validate,

    /// Show the storage root and stored artifacts
    Info,
}

/// Initialize logging; `RUST_LOG` wins over the configured level.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);

    log::info!("mediadrop {} starting...", env!("CARGO_PKG_VERSION"));
    log::debug!("{}", config::describe_source(&cli.config));

    match cli.command {
        Command::Serve {
            host,
            port,
            storage_dir,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = storage_dir {
                config.storage.root_dir = dir;
            }
            config.validate()?;

            let retriever = Arc::new(Retriever::from_config(&config).await?);
            server::serve(&config.server, retriever).await?;
        }

        Command::Fetch { url } => {
            config.validate()?;
            let retriever = Retriever::from_config(&config).await?;
            let artifact = retriever.retrieve(&RetrievalRequest::new(url)).await?;

            let path = retriever.storage().root_dir().join(&artifact.relative_path);
            report::summary(
                "Fetch",
                &[
                    ("file", artifact.relative_path.clone()),
                    ("size", report::format_bytes(artifact.size_bytes)),
                    ("path", path.display().to_string()),
                    ("download", artifact.download_path()),
                ],
            );
        }

        Command::Validate => {
            report::header("Validate");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            report::success(&format!("Config OK ({})", cli.config.display()));

            if config.extractor.engine == EngineKind::YtDlp {
                let version = YtDlpExtractor::new(&config.extractor).version().await?;
                report::success(&format!(
                    "Engine OK ({} {})",
                    config.extractor.binary, version
                ));
            } else {
                report::success("Engine OK (direct)");
            }
        }

        Command::Info => {
            let storage =
                LocalStorage::open(&config.storage.root_dir, config.storage.scratch_dir()).await?;
            let artifacts = storage.list().await?;

            report::header("Storage");
            report::sub_item(&format!("Root: {}", storage.root_dir().display()));
            if artifacts.is_empty() {
                report::sub_item("No stored artifacts yet.");
            }
            for artifact in &artifacts {
                let modified = artifact
                    .modified
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                report::sub_item(&format!(
                    "{}  {}  {}",
                    modified,
                    report::format_bytes(artifact.size_bytes),
                    artifact.name
                ));
            }

            let total: u64 = artifacts.iter().map(|a| a.size_bytes).sum();
            report::summary(
                "Storage",
                &[
                    ("artifacts", artifacts.len().to_string()),
                    ("total", report::format_bytes(total)),
                ],
            );
        }
    }

    Ok(())
}
