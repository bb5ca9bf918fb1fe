use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{ApiKeyGate, AuthContext, API_KEY_HEADER};

/// API key gate middleware.
///
/// Inspects the `X-API-Key` header and injects an [`AuthContext`] into the
/// request extensions: authenticated on an exact match, anonymous otherwise.
/// It never rejects; that is left to [`enforce_policy`](super::enforce_policy).
pub async fn api_key_gate(
    State(gate): State<Arc<ApiKeyGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = maybe_attach_principal(&gate, request.headers());
    if let Some(principal) = context.principal {
        tracing::debug!("Request authenticated as {}", principal.name());
    }
    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Header values that are not visible ASCII never match.
pub fn maybe_attach_principal(gate: &ApiKeyGate, headers: &HeaderMap) -> AuthContext {
    let candidate = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    gate.inspect(candidate)
}
