//! # HTTP API
//!
//! JSON API over the companion service.
//!
//! Layers, outermost first: request tracing, CORS, body limit, global rate
//! limit. Every store call runs on the blocking pool. Mutations that end in a
//! level write hold the child's lock from [`ChildLocks`] for their whole
//! read-recompute-write sequence.

mod auth;
mod error;
mod handlers;
mod locks;
pub mod types;

pub use auth::{BearerToken, CurrentUser};
pub use error::ApiError;
pub use locks::{ChildGuard, ChildLocks};

use crate::config::{MAX_BODY_BYTES, ServerConfig};
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use wordsprout_core::{Companion, Store};

/// Store handle shared by every request.
pub type SharedStore = Box<dyn Store + Send + Sync>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    companion: Arc<Companion<SharedStore>>,
    locks: ChildLocks,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(store: SharedStore, config: &ServerConfig) -> Self {
        Self {
            companion: Arc::new(Companion::new(store).with_session_ttl(config.session_ttl())),
            locks: ChildLocks::default(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(
                config.rate_limit_per_second(),
            ))),
        }
    }

    pub fn companion(&self) -> &Companion<SharedStore> {
        &self.companion
    }

    pub fn locks(&self) -> &ChildLocks {
        &self.locks
    }

    /// Run a service call on the blocking pool.
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Companion<SharedStore>) -> wordsprout_core::error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let companion = Arc::clone(&self.companion);
        tokio::task::spawn_blocking(move || f(&companion))
            .await
            .map_err(ApiError::from_join)?
            .map_err(ApiError::from)
    }
}

/// Build the full router.
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router, ApiError> {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/sign-up", post(handlers::sign_up))
        .route("/auth/sign-in", post(handlers::sign_in))
        .route("/auth/sign-out", post(handlers::sign_out))
        .route(
            "/children",
            get(handlers::list_children).post(handlers::add_child),
        )
        .route(
            "/children/{id}",
            get(handlers::get_child).delete(handlers::delete_child),
        )
        .route("/children/{id}/level", put(handlers::set_child_level))
        .route("/children/{id}/vocabulary", get(handlers::child_vocabulary))
        .route(
            "/children/{id}/words/{word_id}",
            put(handlers::update_word_status),
        )
        .route("/children/{id}/progress", get(handlers::progress))
        .route(
            "/children/{id}/exercises/{exercise_id}",
            post(handlers::record_exercise),
        )
        .route("/vocabulary", get(handlers::vocabulary))
        .route("/levels", get(handlers::levels))
        .route("/levels/assess", get(handlers::assess))
        .route("/exercises", get(handlers::exercises));

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.cors_origin.as_deref())?)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Ok(routes.layer(layers).with_state(state))
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ApiError> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin).map_err(|_| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("invalid CORS origin '{}'", origin),
            )
        })?),
        None => AllowOrigin::any(),
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]))
}

async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.limiter.check().is_err() {
        warn!(path = %request.uri().path(), "rate limit exceeded");
        return ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response();
    }
    next.run(request).await
}
