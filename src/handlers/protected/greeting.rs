use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// GET /greeting - smallest possible key-protected resource
pub async fn greeting() -> ApiResult<Greeting> {
    let greeting = Greeting {
        message: format!("Hello from {}", env!("CARGO_PKG_NAME")),
        timestamp: Utc::now(),
    };
    tracing::info!("greeting endpoint called");
    Ok(ApiResponse::success(greeting))
}
