use axum::extract::FromRef;

use crate::catalog_store::SqliteCatalogStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<SqliteCatalogStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, catalog_store: GuardedCatalogStore) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
