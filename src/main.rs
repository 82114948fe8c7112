use anyhow::Context;
use std::net::SocketAddr;
use tire_search::config::Config;
use tire_search::service::catalog::IndexSettings;
use tire_search::service::SearchService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    let service = SearchService::new(config.clone())?;

    tracing::info!(url = %config.meili_url, index = %config.products_index, "connecting to meilisearch");
    let (health, version) = service
        .health()
        .await
        .context("connect to meilisearch")?;
    tracing::info!(status = %health.status, version = %version.pkg_version, "meilisearch reachable");

    if config.apply_default_settings {
        let task = service
            .update_settings(IndexSettings::tire_catalog())
            .await
            .context("apply default index settings")?;
        tracing::info!(task_uid = %task.task_uid, status = %task.status, "default index settings applied");
    }

    let app = tire_search::api::router(service);
    let addr = SocketAddr::new(config.bind_addr, config.port);

    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
