//! Access tokens
//!
//! Users are authenticated by an external identity provider, which shares a secret with this server. A token is
//! `base64url(claims) "." base64url(HMAC-SHA256(secret, base64url(claims)))`, where the claims are the JSON
//! serialization of [`AccessClaims`]. Both parts use the URL-safe alphabet without padding.
//!
//! The server accepts the token in either the `Authorization: Bearer <token>` header or the `vault_access_token` header.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use log::*;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use vault_common::Secret;
use vault_engine::db_types::{Actor, Role, Roles, UserId};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "vault_access_token";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub roles: Roles,
    /// Expiry, as a unix timestamp in seconds
    pub exp: i64,
}

impl AccessClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// The caller, acting as a buyer on their own orders.
    pub fn buyer(&self) -> Actor {
        Actor::buyer(self.user_id.clone())
    }

    pub fn operator(&self) -> Actor {
        Actor::operator(self.user_id.clone())
    }
}

/// Validated claims are placed in the request extensions by [`crate::middleware::AuthenticationMiddlewareFactory`].
impl FromRequest for AccessClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<AccessClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// Pulls the raw access token out of the request headers, preferring the `Authorization` header.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim);
    bearer.or_else(|| headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()).map(str::trim))
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Secret<Vec<u8>>,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.secret.clone(), lifetime: config.token_lifetime }
    }

    /// Issue a new access token for the given user and roles.
    /// This method DOES NOT check that the user is entitled to the roles. That is the identity provider's job.
    pub fn issue_token(&self, user_id: UserId, roles: Roles, lifetime: Option<Duration>) -> Result<String, AuthError> {
        let exp = Utc::now() + lifetime.unwrap_or(self.lifetime);
        let claims = AccessClaims { user_id, roles, exp: exp.timestamp() };
        self.sign_claims(&claims)
    }

    pub fn sign_claims(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        let json = serde_json::to_vec(claims).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let payload = base64::encode_config(json, base64::URL_SAFE_NO_PAD);
        let mac = self.mac(&payload)?.finalize().into_bytes();
        let signature = base64::encode_config(mac, base64::URL_SAFE_NO_PAD);
        Ok(format!("{payload}.{signature}"))
    }

    /// Checks the token signature and expiry, and returns the claims it carries.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected <claims>.<signature>".into()))?;
        let signature = base64::decode_config(signature, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Invalid signature encoding. {e}")))?;
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::ValidationError("signature has failed verification".into()))?;
        let json = base64::decode_config(payload, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Invalid claims encoding. {e}")))?;
        let claims = serde_json::from_slice::<AccessClaims>(&json)
            .map_err(|e| AuthError::PoorlyFormattedToken(format!("Invalid claims. {e}")))?;
        if claims.is_expired_at(Utc::now()) {
            debug!("🔐️ Access token for {} expired at {}", claims.user_id, claims.exp);
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.reveal())
            .map_err(|e| AuthError::ValidationError(format!("Unusable signing key. {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}
