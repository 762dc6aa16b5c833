//! HTTP server layer for Image Vault.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            /products   /products/{id}   /health                 │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │ (API key)   │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{auth_middleware, ApiKeyAuth, AuthError, DEFAULT_API_KEY_HEADER};
pub use handlers::{
    destroy_handler, health_handler, index_handler, show_handler, store_handler, AppState,
    ErrorResponse, HealthResponse, IndexQueryParams, MessageResponse,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_BODY_SIZE};
