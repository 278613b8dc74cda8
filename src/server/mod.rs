pub mod router;

use tokio::net::TcpListener;

use crate::RegistryError;

/// Bind the HTTP listener; address and socket failures surface as
/// [`RegistryError::Io`].
pub async fn bind(listen_addr: &str) -> Result<TcpListener, RegistryError> {
    Ok(TcpListener::bind(listen_addr).await?)
}
