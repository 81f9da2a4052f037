use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::Authorizer;
use crate::config::Settings;
use crate::directory::DirectoryService;
use crate::routes::{authorize, health};
use crate::storage::StorageService;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub authorizer: Arc<Authorizer>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        directory: Arc<dyn DirectoryService>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        let authorizer = Authorizer::new(&settings, directory, storage);
        Self {
            settings: Arc::new(settings),
            authorizer: Arc::new(authorizer),
        }
    }
}

/// Assemble the router. Tests call this with in-memory collaborators; main
/// wires up the LDAP directory and the S3 client.
pub fn create_app(
    settings: Settings,
    directory: Arc<dyn DirectoryService>,
    storage: Arc<dyn StorageService>,
) -> Router {
    let state = AppState::new(settings, directory, storage);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/authorize", post(authorize::authorize))
        .route("/api/health", get(health::health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
