use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use axum::Router;
use consent_broker::{
    config::{AccessPolicy, ConsentSettings},
    consent::ConsentUrlIssuer,
    http,
    providers::ProviderRegistry,
    reporting::{FileThreadStore, ReportingService},
    secrets::SecretProvider,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!("consent broker shut down with error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_tracing();

    let policy = Arc::new(AccessPolicy::from_env());
    let identity = ProviderRegistry::from_env(policy.clone())?;
    tracing::info!(
        github = identity.github().is_some(),
        azure_ad = identity.azure().is_some(),
        dev = identity.dev().is_some(),
        "identity providers configured"
    );

    let settings = Arc::new(ConsentSettings::from_env()?);
    let secrets = Arc::new(SecretProvider::from_env()?);
    // resolve the signing secret up front so misconfiguration fails at boot
    secrets.signer().await?;

    let issuer = Arc::new(ConsentUrlIssuer::new(settings.clone(), secrets.clone()));

    let data_dir =
        PathBuf::from(std::env::var("REPORTING_DATA_DIR").unwrap_or_else(|_| "./data".into()));
    let store = Arc::new(FileThreadStore::new(data_dir)?);
    let reporting = Arc::new(ReportingService::new(store));

    let context = Arc::new(http::AppContext {
        settings,
        secrets,
        issuer,
        reporting,
    });

    let router: Router = http::router(context);
    let host = std::env::var("BROKER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("BROKER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(?addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
