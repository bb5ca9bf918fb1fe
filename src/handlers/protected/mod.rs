// handlers/protected/mod.rs - API key required
//
// Everything here sits behind the auth gate and the authorization policy.
// A request only reaches these handlers once the policy has accepted it,
// so none of them look at credentials themselves.

pub mod greeting;
pub mod tasks;

pub use greeting::greeting;
