use clap::Parser;
use client_registry::config::{Cli, Config};
use client_registry::RegistryError;
use client_registry::db::ClientStorage;
use client_registry::server::router::{RegistryState, registry_router};
use mimalloc::MiMalloc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        seed_demo_data = cfg.seed_demo_data
    );

    let storage = match ClientStorage::open(&cfg.database_url).await {
        Ok(storage) => storage,
        Err(e) => {
            error!(error = %e, "failed to open sqlite");
            std::process::exit(1);
        }
    };

    if let Err(e) = storage.init_schema().await {
        error!(error = %e, "failed to migrate schema");
        storage.close().await;
        std::process::exit(1);
    }

    if cfg.seed_demo_data {
        client_registry::service::seed::seed_demo_data(&storage).await;
    }

    let served = serve(&cfg, storage.clone()).await;
    storage.close().await;
    info!("storage closed");
    if let Err(e) = &served {
        error!(error = %e, "HTTP server failed");
    }
    Ok(served?)
}

async fn serve(cfg: &Config, storage: ClientStorage) -> Result<(), RegistryError> {
    let app = registry_router(RegistryState::new(storage));

    let listener = client_registry::server::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
