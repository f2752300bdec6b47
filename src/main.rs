use anyhow::{Context, Result};
use aviateur_gateway::{
    config::{AppConfig, StoreBackend},
    routes,
    services::{
        blob_store::BlobStore,
        disk_store::DiskBlobStore,
        gateway_service::GatewayService,
        s3_store::{S3BlobStore, S3Config},
    },
};
use axum::Router;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!(
        backend = ?cfg.store_backend,
        bucket = %cfg.bucket,
        scratch_dir = %cfg.scratch_dir,
        "Starting aviateur-gateway"
    );

    // --- Ensure scratch directory exists ---
    if !Path::new(&cfg.scratch_dir).exists() {
        fs::create_dir_all(&cfg.scratch_dir)?;
        tracing::info!("Created scratch directory at {}", cfg.scratch_dir);
    }

    // --- Wire the blob-store backend ---
    let store: Arc<dyn BlobStore> = match cfg.store_backend {
        StoreBackend::S3 => {
            let access_key_id = cfg
                .access_key_id
                .clone()
                .context("AVIATEUR_ACCESS_KEY_ID is required for the s3 backend")?;
            let secret_access_key = cfg
                .secret_access_key
                .clone()
                .context("AVIATEUR_SECRET_ACCESS_KEY is required for the s3 backend")?;
            Arc::new(S3BlobStore::new(S3Config {
                endpoint: cfg.store_endpoint.clone(),
                region: cfg.store_region.clone(),
                bucket: cfg.bucket.clone(),
                access_key_id,
                secret_access_key,
            }))
        }
        StoreBackend::Disk => Arc::new(DiskBlobStore::new(cfg.disk_root.as_str(), cfg.bucket.as_str())),
    };

    // --- Initialize core service ---
    let gateway = GatewayService::new(store, cfg.scratch_dir.as_str(), cfg.public_base_url.as_str());

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(gateway);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
