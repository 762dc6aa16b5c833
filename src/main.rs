//! Image Vault - An authenticated REST API for uploaded images.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_vault::{
    blob::{create_s3_client, BlobStore, LocalBlobStore, S3BlobStore},
    config::{Config, StorageBackend},
    images::ImageService,
    record::{MemoryRecordStore, RecordStore, SqliteRecordStore},
    server::{create_router, ApiKeyAuth, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Image Vault v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Auth header: {}", config.api_key_header.trim());
    if config.api_key_or_empty().is_empty() {
        warn!("  Auth: no API key configured - every /products request will be rejected");
        warn!("        Set --api-key or API_KEY");
    } else {
        info!("  Auth: enabled");
    }
    info!("  Max body size: {} bytes", config.max_body_size);

    let auth = match ApiKeyAuth::new(config.api_key_header.trim(), config.api_key_or_empty()) {
        Ok(auth) => auth,
        Err(e) => {
            error!("Invalid API key header name: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let blobs = match build_blob_store(&config).await {
        Ok(blobs) => blobs,
        Err(e) => {
            error!("Failed to set up blob storage: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let records = match build_record_store(&config) {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to open record store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = ImageService::new(blobs, records);
    let router = create_router(service, build_router_config(&config, auth));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -H '{}: <key>' http://{}/products",
        config.api_key_header.trim(),
        addr
    );
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_vault=debug,tower_http=debug"
    } else {
        "image_vault=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Create the configured blob store.
async fn build_blob_store(config: &Config) -> Result<Arc<dyn BlobStore>, String> {
    match config.storage {
        StorageBackend::Local => {
            info!("  Storage: local ({})", config.storage_root.display());
            tokio::fs::create_dir_all(&config.storage_root)
                .await
                .map_err(|e| format!("{}: {}", config.storage_root.display(), e))?;
            Ok(Arc::new(LocalBlobStore::new(&config.storage_root)))
        }
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| "S3 bucket is not set".to_string())?;

            info!("  Storage: s3 (bucket {})", bucket);
            if let Some(ref endpoint) = config.s3_endpoint {
                info!("  S3 endpoint: {}", endpoint);
            }
            info!("  S3 region: {}", config.s3_region);

            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;

            info!("Connecting to S3...");
            client
                .head_bucket()
                .bucket(&bucket)
                .send()
                .await
                .map_err(|e| {
                    format!(
                        "bucket '{}' is not accessible ({}). Check credentials and endpoint",
                        bucket, e
                    )
                })?;
            info!("  Connected successfully");

            let mut store = S3BlobStore::new(client, bucket);
            if let Some(ref prefix) = config.s3_prefix {
                store = store.with_prefix(prefix.as_str());
            }
            Ok(Arc::new(store))
        }
    }
}

/// Create the configured record store.
fn build_record_store(
    config: &Config,
) -> Result<Arc<dyn RecordStore>, image_vault::RecordError> {
    match config.database {
        Some(ref path) => {
            info!("  Records: sqlite ({})", path.display());
            Ok(Arc::new(SqliteRecordStore::open(path)?))
        }
        None => {
            warn!("  Records: in-memory - records are lost on restart");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
    }
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config, auth: ApiKeyAuth) -> RouterConfig {
    let mut router_config = RouterConfig::new(auth).with_max_body_size(config.max_body_size);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
