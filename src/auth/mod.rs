use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Request header carrying the shared secret. Header lookups are
/// case-insensitive, so `x-api-key` and `X-API-Key` are the same header.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The single identity granted to any caller presenting the shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    ApiUser,
}

impl Principal {
    pub fn name(&self) -> &'static str {
        match self {
            Principal::ApiUser => "api-user",
        }
    }
}

/// Outcome of the auth gate, attached to every request that passes through it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub principal: Option<Principal>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

/// Process-wide shared secret, fixed at startup.
///
/// Only a SHA-256 digest is kept. Candidates are digested the same way and
/// compared in constant time, so neither content nor length leaks.
pub struct ApiKeyGate {
    digest: Option<[u8; 32]>,
}

impl ApiKeyGate {
    /// An empty secret matches nothing.
    pub fn new(secret: &str) -> Self {
        let digest = (!secret.is_empty()).then(|| Self::digest(secret));
        Self { digest }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match &self.digest {
            Some(expected) => bool::from(Self::digest(candidate)[..].ct_eq(&expected[..])),
            None => false,
        }
    }

    /// Turn an optional header value into an auth context. Never fails.
    pub fn inspect(&self, candidate: Option<&str>) -> AuthContext {
        match candidate {
            Some(value) if self.matches(value) => AuthContext::authenticated(Principal::ApiUser),
            _ => AuthContext::anonymous(),
        }
    }

    fn digest(value: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(value.as_bytes()));
        out
    }
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate")
            .field("configured", &self.digest.is_some())
            .finish()
    }
}
