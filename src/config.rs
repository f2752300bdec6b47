use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub scratch_dir: String,
    pub bucket: String,
    pub public_base_url: String,
    pub store_backend: StoreBackend,
    pub store_endpoint: Option<String>,
    pub store_region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub disk_root: String,
}

/// Which blob-store backend to wire in at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// S3-compatible remote store (default).
    S3,
    /// Local-disk store, for development and tests.
    Disk,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Object-storage upload/listing gateway")]
pub struct Args {
    /// Host to bind to (overrides AVIATEUR_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides AVIATEUR_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploads are staged (overrides AVIATEUR_SCRATCH_DIR)
    #[arg(long)]
    pub scratch_dir: Option<String>,

    /// Bucket name (overrides AVIATEUR_BUCKET / B2_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Public CDN origin for stored objects (overrides AVIATEUR_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Blob-store backend (overrides AVIATEUR_STORE_BACKEND)
    #[arg(long, value_enum)]
    pub store_backend: Option<StoreBackend>,

    /// S3 endpoint URL (overrides AVIATEUR_STORE_ENDPOINT)
    #[arg(long)]
    pub store_endpoint: Option<String>,

    /// S3 region (overrides AVIATEUR_STORE_REGION)
    #[arg(long)]
    pub store_region: Option<String>,

    /// Root directory for the disk backend (overrides AVIATEUR_DISK_ROOT)
    #[arg(long)]
    pub disk_root: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("AVIATEUR_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("AVIATEUR_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing AVIATEUR_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3001,
            Err(err) => return Err(err).context("reading AVIATEUR_PORT"),
        };
        let env_scratch =
            env::var("AVIATEUR_SCRATCH_DIR").unwrap_or_else(|_| "./data/scratch".into());
        // B2_BUCKET_NAME is honored for drop-in compatibility with existing
        // deployments.
        let env_bucket = env::var("AVIATEUR_BUCKET")
            .or_else(|_| env::var("B2_BUCKET_NAME"))
            .ok();
        let env_public_url =
            env::var("AVIATEUR_PUBLIC_URL").unwrap_or_else(|_| "https://cdn.aviateur.tech".into());
        let env_backend = match env::var("AVIATEUR_STORE_BACKEND") {
            Ok(value) => Some(parse_backend(&value)?),
            Err(_) => None,
        };
        let env_endpoint = env::var("AVIATEUR_STORE_ENDPOINT").ok();
        let env_region = env::var("AVIATEUR_STORE_REGION").unwrap_or_else(|_| "us-east-1".into());
        let env_disk_root = env::var("AVIATEUR_DISK_ROOT").unwrap_or_else(|_| "./data/objects".into());

        // Credentials are environment-only; never accepted on the command line.
        let access_key_id = env::var("AVIATEUR_ACCESS_KEY_ID").ok();
        let secret_access_key = env::var("AVIATEUR_SECRET_ACCESS_KEY").ok();

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            scratch_dir: args.scratch_dir.unwrap_or(env_scratch),
            bucket: args
                .bucket
                .or(env_bucket)
                .context("bucket name is required (AVIATEUR_BUCKET or --bucket)")?,
            public_base_url: args.public_url.unwrap_or(env_public_url),
            store_backend: args.store_backend.or(env_backend).unwrap_or(StoreBackend::S3),
            store_endpoint: args.store_endpoint.or(env_endpoint),
            store_region: args.store_region.unwrap_or(env_region),
            access_key_id,
            secret_access_key,
            disk_root: args.disk_root.unwrap_or(env_disk_root),
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_backend(value: &str) -> Result<StoreBackend> {
    match value.to_ascii_lowercase().as_str() {
        "s3" => Ok(StoreBackend::S3),
        "disk" => Ok(StoreBackend::Disk),
        other => bail!("unknown AVIATEUR_STORE_BACKEND value `{}`", other),
    }
}
