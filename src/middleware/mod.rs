pub mod auth;
pub mod policy;
pub mod response;

pub use auth::{api_key_gate, maybe_attach_principal};
pub use policy::{authorize, enforce_policy, Access, Decision};
pub use response::{ApiResponse, ApiResult};
