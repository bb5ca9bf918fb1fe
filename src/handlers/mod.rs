// handlers/mod.rs - two security tiers
//
// Public (no credential) → Protected (X-API-Key required).
// The tier is enforced by middleware::policy, not by the handlers.
pub mod protected;
pub mod public;
