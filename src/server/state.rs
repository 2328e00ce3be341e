use axum::extract::FromRef;

use crate::catalog_store::CatalogStore;
use crate::metadata::{OpenLibraryClient, WikipediaClient};
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type SharedWikipediaClient = Arc<WikipediaClient>;
pub type SharedOpenLibraryClient = Arc<OpenLibraryClient>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub store: GuardedCatalogStore,
    pub wikipedia: SharedWikipediaClient,
    pub open_library: SharedOpenLibraryClient,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}

impl FromRef<ServerState> for SharedWikipediaClient {
    fn from_ref(input: &ServerState) -> Self {
        input.wikipedia.clone()
    }
}

impl FromRef<ServerState> for SharedOpenLibraryClient {
    fn from_ref(input: &ServerState) -> Self {
        input.open_library.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
