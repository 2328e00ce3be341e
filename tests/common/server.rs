//! Test server lifecycle management
//!
//! Each test gets an isolated server on a random port with its own database.

use referent_server::catalog_store::SqliteCatalogStore;
use referent_server::metadata::{OpenLibraryClient, WikipediaClient};
use referent_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A metadata base URL nothing listens on; lookups against it fail fast and
/// exercise the degrade-to-no-data paths.
pub const UNREACHABLE_UPSTREAM: &str = "http://127.0.0.1:9";

pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Keep the database directory alive until the test drops the server.
    _temp_db_dir: TempDir,
}

impl TestServer {
    /// Spawn a server whose metadata clients point at an unreachable
    /// upstream. Fine for everything that does not assert on enrichment.
    pub async fn spawn() -> Self {
        Self::spawn_with_upstreams(UNREACHABLE_UPSTREAM, UNREACHABLE_UPSTREAM).await
    }

    /// Spawn a server with the metadata clients pointed at the given base
    /// URLs (usually mock upstreams from `mock_upstream`).
    pub async fn spawn_with_upstreams(wikipedia_url: &str, open_library_url: &str) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("referent.sqlite3");
        let store =
            Arc::new(SqliteCatalogStore::new(&db_path).expect("Failed to open catalog store"));

        let wikipedia = Arc::new(
            WikipediaClient::new(wikipedia_url.to_string(), 5)
                .expect("Failed to build Wikipedia client"),
        );
        let open_library = Arc::new(
            OpenLibraryClient::new(open_library_url.to_string(), 5)
                .expect("Failed to build Open Library client"),
        );

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app =
            make_app(config, store, wikipedia, open_library).expect("Failed to build test app");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base_url: format!("http://127.0.0.1:{}", port),
            port,
            _temp_db_dir: temp_db_dir,
        }
    }
}
