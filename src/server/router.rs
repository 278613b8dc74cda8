use axum::{
    Router,
    routing::get,
};

use crate::db::ClientStorage;
use crate::handlers::clients::{
    average_age_handler, create_client_handler, list_clients_handler,
};

/// Shared per-request state: the storage handle, passed explicitly.
#[derive(Clone)]
pub struct RegistryState {
    pub storage: ClientStorage,
}

impl RegistryState {
    pub fn new(storage: ClientStorage) -> Self {
        Self { storage }
    }
}

pub fn registry_router(state: RegistryState) -> Router {
    Router::new()
        .route("/", get(list_clients_handler).post(create_client_handler))
        .route("/age/avg", get(average_age_handler))
        .with_state(state)
}
