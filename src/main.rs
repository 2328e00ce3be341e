use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use referent_server::catalog_store::SqliteCatalogStore;
use referent_server::metadata::{OpenLibraryClient, WikipediaClient};
use referent_server::server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite catalog database file.
    #[clap(value_parser = parse_path)]
    pub catalog_db: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Base URL of the encyclopedia service used for biography lookups.
    #[clap(long, default_value = "https://en.wikipedia.org")]
    pub wikipedia_url: String,

    /// Base URL of the bibliographic service used for book lookups.
    #[clap(long, default_value = "https://openlibrary.org")]
    pub open_library_url: String,

    /// Timeout in seconds for external metadata requests.
    #[clap(long, default_value_t = 30)]
    pub metadata_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "Opening SQLite catalog database at {:?}...",
        cli_args.catalog_db
    );
    let store = Arc::new(SqliteCatalogStore::new(&cli_args.catalog_db)?);

    let wikipedia = Arc::new(WikipediaClient::new(
        cli_args.wikipedia_url,
        cli_args.metadata_timeout_sec,
    )?);
    let open_library = Arc::new(OpenLibraryClient::new(
        cli_args.open_library_url,
        cli_args.metadata_timeout_sec,
    )?);

    info!("Ready to serve at port {}!", cli_args.port);
    run_server(
        store,
        wikipedia,
        open_library,
        cli_args.logging_level,
        cli_args.port,
        cli_args.frontend_dir_path,
    )
    .await
}
