pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod model;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{ApiKeyGate, API_KEY_HEADER};
use crate::config::SecurityConfig;
use crate::database::TaskStore;
use crate::handlers::{protected, public};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub gate: Arc<ApiKeyGate>,
}

impl AppState {
    pub fn new(store: Arc<dyn TaskStore>, gate: ApiKeyGate) -> Self {
        Self {
            store,
            gate: Arc::new(gate),
        }
    }
}

/// Build the full router.
///
/// Layers run outermost first: trace → CORS → API key gate → policy → route.
/// With CORS disabled there is no CORS layer at all, so `OPTIONS` goes
/// through the policy like any other method.
pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    use crate::handlers::protected::tasks;

    let router = Router::new()
        // Public
        .route("/health", get(public::health))
        // Protected
        .route("/greeting", get(protected::greeting))
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/tasks/:id",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/tasks/:id/complete", patch(tasks::complete))
        .layer(axum::middleware::from_fn(middleware::enforce_policy))
        .layer(axum::middleware::from_fn_with_state(
            state.gate.clone(),
            middleware::api_key_gate,
        ));

    let router = match cors_layer(security) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)]);
    Some(layer)
}
