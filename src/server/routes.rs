//! Router configuration for Image Vault.
//!
//! This module defines the HTTP routes and applies middleware for authentication,
//! body limits and CORS.
//!
//! # Route Structure
//!
//! ```text
//! /health                  - Health check (public)
//! /products                - List (GET) and upload (POST) images (protected)
//! /products/{id}           - Show (GET) and delete (DELETE) an image (protected)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use image_vault::blob::LocalBlobStore;
//! use image_vault::images::ImageService;
//! use image_vault::record::MemoryRecordStore;
//! use image_vault::server::auth::ApiKeyAuth;
//! use image_vault::server::routes::{create_router, RouterConfig};
//!
//! let service = ImageService::new(
//!     LocalBlobStore::new("storage/public"),
//!     MemoryRecordStore::new(),
//! );
//!
//! let config = RouterConfig::new(ApiKeyAuth::with_default_header("my-secret-key"))
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, ApiKeyAuth};
use super::handlers::{
    destroy_handler, health_handler, index_handler, show_handler, store_handler, AppState,
};
use crate::blob::BlobStore;
use crate::images::ImageService;
use crate::record::RecordStore;

/// Default request body limit (10 MiB).
///
/// Must stay above the image size limit so that oversized images are
/// reported as validation errors rather than rejected bodies.
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Header-based API key authenticator for the `/products` routes
    pub auth: ApiKeyAuth,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum accepted request body size in bytes
    pub max_body_size: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration with the given authenticator.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Bodies up to 10 MiB are accepted
    /// - Tracing is enabled
    pub fn new(auth: ApiKeyAuth) -> Self {
        Self {
            auth,
            cors_origins: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the maximum request body size in bytes.
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public routes (health check)
/// - Protected routes (image API behind the API key header)
/// - Request body limit
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<B, R>(service: ImageService<B, R>, config: RouterConfig) -> Router
where
    B: BlobStore + 'static,
    R: RecordStore + 'static,
{
    let app_state = AppState::new(service);
    let cors = build_cors_layer(&config);

    // Auth wraps the whole resource router, so unmatched methods are gated too
    let protected_routes = Router::new()
        .route(
            "/products",
            get(index_handler::<B, R>).post(store_handler::<B, R>),
        )
        .route(
            "/products/{id}",
            get(show_handler::<B, R>).delete(destroy_handler::<B, R>),
        )
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(middleware::from_fn_with_state(
            config.auth.clone(),
            auth_middleware,
        ));

    let public_routes = Router::new().route("/health", get(health_handler));

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, config.auth.header_name().clone()])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
