use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::{AuthSettings, ConfigError};
use crate::services::auth::claims::{AuthContext, AuthFailure, TokenError, admin_claim};

/// Clock skew tolerated on `exp` / `nbf`.
pub const LEEWAY_SECONDS: u64 = 10;

/// Lifetime of tokens produced by [`TokenAuthenticator::issue_token`].
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// HS256 bearer-token verifier and issuer.
///
/// - Key material is not printable via Debug.
/// - Built only from complete [`AuthSettings`], so a value of this type always
///   has a signing key, an issuer and an audience.
pub struct TokenAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenAuthenticator {
    pub fn new(settings: &AuthSettings) -> Self {
        let secret = settings.hmac_key.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = LEEWAY_SECONDS;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
        }
    }

    /// Reads `HMAC_KEY`, `ISSUER` and `AUDIENCE`; fails if any is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = AuthSettings::from_env()?;
        Ok(Self::new(&settings))
    }

    /// Boolean gate over [`verify`](Self::verify). The failure reason is
    /// logged by `verify`.
    pub fn authenticate(&self, token: &str, needs_admin: bool) -> bool {
        self.verify(token, needs_admin).is_ok()
    }

    /// Decode, verify signature + `iss`/`aud`/`exp`, then check `user.admin`
    /// when `needs_admin` is set.
    ///
    /// A leading `Bearer` scheme (any case) is ignored.
    pub fn verify(&self, token: &str, needs_admin: bool) -> Result<AuthContext, AuthFailure> {
        let result = self.verify_inner(strip_scheme(token), needs_admin);

        if let Err(failure) = &result {
            warn!(reason = %failure, needs_admin, "token authentication failed");
        }

        result
    }

    fn verify_inner(&self, token: &str, needs_admin: bool) -> Result<AuthContext, AuthFailure> {
        jsonwebtoken::decode_header(token).map_err(|e| AuthFailure::Decode(e.to_string()))?;

        let data =
            jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)
                .map_err(classify)?;

        let claims = data.claims;

        if needs_admin {
            match admin_claim(&claims) {
                Some(true) => {}
                Some(false) => return Err(AuthFailure::NotAdmin),
                None => return Err(AuthFailure::MissingAdminProperty),
            }
        }

        Ok(AuthContext::from_claims(claims))
    }

    /// Sign a new token carrying `claims`.
    ///
    /// Caller claims are copied over the defaults (`iss`, `aud`, `iat`, `jti`)
    /// and may replace them. `exp` is always set to one hour from now.
    pub fn issue_token(&self, claims: Option<Map<String, Value>>) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();

        let mut payload = Map::new();
        payload.insert("iss".to_string(), Value::from(self.issuer.clone()));
        payload.insert("aud".to_string(), Value::from(self.audience.clone()));
        payload.insert("iat".to_string(), Value::from(now));
        payload.insert("jti".to_string(), Value::from(Uuid::new_v4().to_string()));

        if let Some(claims) = claims {
            payload.extend(claims);
        }

        payload.insert("exp".to_string(), Value::from(now + TOKEN_TTL_SECONDS));

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        jsonwebtoken::encode(&header, &payload, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign token");
            TokenError::Signing(e)
        })
    }
}

fn strip_scheme(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    }
}

fn classify(e: jsonwebtoken::errors::Error) -> AuthFailure {
    match e.kind() {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
            AuthFailure::Decode(e.to_string())
        }
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::ExpiredSignature
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingRequiredClaim(_) => AuthFailure::Verification(e.to_string()),
        _ => AuthFailure::Unexpected(e.to_string()),
    }
}
