use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a bearer token was refused.
///
/// The `Display` text is what ends up in logs and in the
/// `x-gate-auth-reason` response header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("unable to decode token: {0}")]
    Decode(String),

    #[error("unable to verify token signature or claims: {0}")]
    Verification(String),

    #[error("needed admin - property user.admin does not exist in token")]
    MissingAdminProperty,

    #[error("needed admin - not admin")]
    NotAdmin,

    #[error("token exception - {0}")]
    Unexpected(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Facts extracted from a verified token, handed to protected handlers.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub claims: Map<String, Value>,
    /// `Some` only when the claims carry a boolean `user.admin`.
    pub admin: Option<bool>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl AuthContext {
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        let admin = admin_claim(&claims);

        let issuer = claims
            .get("iss")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let audience = match claims.get("aud") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let expiry = claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Self {
            claims,
            admin,
            issuer,
            audience,
            expiry,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin == Some(true)
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

/// Reads `user.admin`, accepting only an object `user` with a boolean `admin`.
pub(crate) fn admin_claim(claims: &Map<String, Value>) -> Option<bool> {
    claims
        .get("user")
        .and_then(Value::as_object)
        .and_then(|user| user.get("admin"))
        .and_then(Value::as_bool)
}
