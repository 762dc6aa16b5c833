//! Configuration management for Image Vault.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (`IMAGE_VAULT_` prefix, plus `API_KEY` and
//!   `API_KEY_HEADER_NAME` for the auth gate)
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use image_vault::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `IMAGE_VAULT_HOST` - Server bind address (default: 0.0.0.0)
//! - `IMAGE_VAULT_PORT` - Server port (default: 8000)
//! - `API_KEY_HEADER_NAME` - Header carrying the API key (default: x-api-token)
//! - `API_KEY` - Shared secret; empty rejects every protected request
//! - `IMAGE_VAULT_STORAGE` - Blob backend, `local` or `s3` (default: local)
//! - `IMAGE_VAULT_STORAGE_ROOT` - Root directory for local blobs (default: storage/public)
//! - `IMAGE_VAULT_S3_BUCKET` - S3 bucket name (required for `s3`)
//! - `IMAGE_VAULT_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `IMAGE_VAULT_S3_REGION` - AWS region (default: us-east-1)
//! - `IMAGE_VAULT_S3_PREFIX` - Key prefix inside the bucket
//! - `IMAGE_VAULT_DATABASE` - SQLite file for records (default: in-memory)
//! - `IMAGE_VAULT_MAX_BODY_SIZE` - Request body limit in bytes (default: 10 MiB)
//! - `IMAGE_VAULT_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use axum::http::HeaderName;
use clap::{Parser, ValueEnum};

use crate::images::MAX_IMAGE_BYTES;
use crate::server::{DEFAULT_API_KEY_HEADER, DEFAULT_MAX_BODY_SIZE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default root directory for the local blob store.
pub const DEFAULT_STORAGE_ROOT: &str = "storage/public";

/// Blob storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// Files under a local directory
    Local,
    /// Objects in an S3 or S3-compatible bucket
    S3,
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image Vault - An authenticated REST API for uploaded images.
///
/// Stores image files in a local directory or an S3 bucket and keeps their
/// metadata in SQLite or in memory.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-vault")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IMAGE_VAULT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "IMAGE_VAULT_PORT")]
    pub port: u16,

    /// Maximum request body size in bytes.
    ///
    /// Must be larger than the 2048 KB image limit.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_SIZE, env = "IMAGE_VAULT_MAX_BODY_SIZE")]
    pub max_body_size: usize,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Name of the request header carrying the API key.
    #[arg(long, default_value = DEFAULT_API_KEY_HEADER, env = "API_KEY_HEADER_NAME")]
    pub api_key_header: String,

    /// Shared secret expected in the API key header.
    ///
    /// If not provided, every protected request is rejected.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Blob storage backend for uploaded files.
    #[arg(long, value_enum, default_value_t = StorageBackend::Local, env = "IMAGE_VAULT_STORAGE")]
    pub storage: StorageBackend,

    /// Root directory for the local blob store.
    #[arg(long, default_value = DEFAULT_STORAGE_ROOT, env = "IMAGE_VAULT_STORAGE_ROOT")]
    pub storage_root: PathBuf,

    /// S3 bucket name (required with `--storage s3`).
    #[arg(long, env = "IMAGE_VAULT_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "IMAGE_VAULT_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "IMAGE_VAULT_S3_REGION")]
    pub s3_region: String,

    /// Key prefix for objects inside the bucket.
    #[arg(long, env = "IMAGE_VAULT_S3_PREFIX")]
    pub s3_prefix: Option<String>,

    /// SQLite database file for image records.
    ///
    /// If not specified, records are kept in memory and lost on restart.
    #[arg(long, env = "IMAGE_VAULT_DATABASE")]
    pub database: Option<PathBuf>,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "IMAGE_VAULT_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        let header = self.api_key_header.trim();
        if header.is_empty() {
            return Err(
                "API key header name is empty. Set --api-key-header or API_KEY_HEADER_NAME"
                    .to_string(),
            );
        }
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            return Err(format!(
                "API key header name '{}' is not a valid HTTP header name",
                header
            ));
        }

        if self.storage == StorageBackend::S3
            && self.s3_bucket.as_deref().map_or(true, |b| b.trim().is_empty())
        {
            return Err(
                "S3 storage requires a bucket name. Set --s3-bucket or IMAGE_VAULT_S3_BUCKET"
                    .to_string(),
            );
        }

        if self.max_body_size <= MAX_IMAGE_BYTES {
            return Err(format!(
                "max_body_size must be larger than the image limit of {} bytes",
                MAX_IMAGE_BYTES
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the API key, or an empty string if none is configured.
    pub fn api_key_or_empty(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }
}

// =============================================================================
// Tests
// =============================================================================
