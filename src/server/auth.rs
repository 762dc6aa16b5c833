//! Shared-secret API key authentication.
//!
//! Every protected request must carry a configured header (default
//! `x-api-token`) whose value equals the configured secret. Anything else is
//! rejected with `401 {"message": "Unauthorized"}`.
//!
//! # Security Properties
//!
//! - **Constant-time comparison**: the presented key is compared with
//!   `subtle::ConstantTimeEq`
//! - **Fails closed**: an empty secret rejects every request, including one
//!   that sends an empty header
//! - **No key logging**: rejected keys are never written to the logs
//!
//! # Example
//!
//! ```rust
//! use axum::http::HeaderMap;
//! use image_vault::server::auth::ApiKeyAuth;
//!
//! let auth = ApiKeyAuth::with_default_header("my-secret");
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-api-token", "my-secret".parse().unwrap());
//! assert!(auth.verify(&headers).is_ok());
//! ```

use axum::{
    extract::{Request, State},
    http::{header::InvalidHeaderName, HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::handlers::ErrorResponse;

/// Default name of the API key header.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-token";

// =============================================================================
// Types
// =============================================================================

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The API key header is absent
    MissingKey,

    /// The API key header is present but does not match
    InvalidKey,

    /// No secret is configured, so nothing can authenticate
    NotConfigured,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingKey => write!(f, "Missing API key header"),
            AuthError::InvalidKey => write!(f, "Invalid API key"),
            AuthError::NotConfigured => write!(f, "No API key configured"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Unauthorized")),
        )
            .into_response()
    }
}

// =============================================================================
// API Key Authentication
// =============================================================================

/// Authenticator comparing one request header against a shared secret.
#[derive(Clone)]
pub struct ApiKeyAuth {
    header_name: HeaderName,
    secret: Vec<u8>,
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("header_name", &self.header_name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl ApiKeyAuth {
    /// Create an authenticator reading `header_name` (case-insensitive).
    pub fn new(
        header_name: impl AsRef<str>,
        secret: impl AsRef<[u8]>,
    ) -> Result<Self, InvalidHeaderName> {
        let header_name = HeaderName::from_bytes(header_name.as_ref().trim().as_bytes())?;
        Ok(Self {
            header_name,
            secret: secret.as_ref().to_vec(),
        })
    }

    /// Create an authenticator reading the default `x-api-token` header.
    pub fn with_default_header(secret: impl AsRef<[u8]>) -> Self {
        Self {
            header_name: HeaderName::from_static(DEFAULT_API_KEY_HEADER),
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Name of the header carrying the key.
    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    /// Whether a non-empty secret is configured.
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Check the request headers against the configured secret.
    pub fn verify(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        if !self.is_configured() {
            return Err(AuthError::NotConfigured);
        }

        let provided = headers
            .get(&self.header_name)
            .ok_or(AuthError::MissingKey)?;

        if provided.as_bytes().ct_eq(&self.secret).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidKey)
        }
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware that rejects requests without a matching API key.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use image_vault::server::auth::{ApiKeyAuth, auth_middleware};
///
/// let auth = ApiKeyAuth::with_default_header("secret-key");
/// let app = Router::new()
///     .route("/products", get(index_handler))
///     .layer(middleware::from_fn_with_state(auth, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(auth): State<ApiKeyAuth>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(err) = auth.verify(request.headers()) {
        warn!(
            header = %auth.header_name(),
            method = %request.method(),
            path = %request.uri().path(),
            "Authentication failed: {}",
            err
        );
        return Err(err);
    }

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
