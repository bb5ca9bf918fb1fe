use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthContext;
use crate::error::ApiError;

/// Routes reachable without a credential. Everything else needs the API key,
/// unknown paths included.
pub const PUBLIC_ROUTES: &[&str] = &["/health"];

/// What a route requires of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    ApiKey,
}

impl Access {
    pub fn for_path(path: &str) -> Self {
        if PUBLIC_ROUTES.contains(&path) {
            Access::Public
        } else {
            Access::ApiKey
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

pub fn authorize(access: Access, context: &AuthContext) -> Decision {
    match access {
        Access::Public => Decision::Accept,
        Access::ApiKey if context.is_authenticated() => Decision::Accept,
        Access::ApiKey => Decision::Reject,
    }
}

/// Authorization middleware. Must run after [`api_key_gate`](super::api_key_gate);
/// a request with no [`AuthContext`] is treated as anonymous.
///
/// Rejection is a bare 403: no body, no challenge header.
pub async fn enforce_policy(request: Request, next: Next) -> Response {
    let access = Access::for_path(request.uri().path());
    let context = request
        .extensions()
        .get::<AuthContext>()
        .copied()
        .unwrap_or_default();

    match authorize(access, &context) {
        Decision::Accept => next.run(request).await,
        Decision::Reject => ApiError::forbidden(format!(
            "{} {} requires an API key",
            request.method(),
            request.uri().path()
        ))
        .into_response(),
    }
}
