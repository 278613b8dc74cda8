use axum::{Json, extract::State};
use tracing::info;

use crate::db::Client;
use crate::middleware::client_request::{ClientPreprocess, NewClient};
use crate::{RegistryError, server::router::RegistryState};

/// GET / -> every client with its credentials.
pub async fn list_clients_handler(
    State(state): State<RegistryState>,
) -> Result<Json<Vec<Client>>, RegistryError> {
    Ok(Json(state.storage.list_clients().await?))
}

/// GET /age/avg -> mean client age as a bare JSON number.
pub async fn average_age_handler(
    State(state): State<RegistryState>,
) -> Result<Json<f64>, RegistryError> {
    Ok(Json(state.storage.average_age().await?))
}

/// POST / -> registers a client from the query string or a JSON body.
pub async fn create_client_handler(
    State(state): State<RegistryState>,
    ClientPreprocess(new_client): ClientPreprocess,
) -> Result<Json<Client>, RegistryError> {
    let NewClient {
        full_name,
        age,
        credentials,
    } = new_client;

    let client = state
        .storage
        .insert_client(&full_name, age, credentials)
        .await?;

    info!(
        id = client.id,
        with_credentials = client.credentials.is_some(),
        "client registered"
    );
    Ok(Json(client))
}
