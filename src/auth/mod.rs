use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::types::Permission;

/// Subject identity carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub permission: Permission,
}

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub data: Identity,
    pub is_refresh: bool,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access token"),
            TokenKind::Refresh => write!(f, "refresh token"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("{0} has expired")]
    Expired(TokenKind),

    #[error("invalid {kind}: {reason}")]
    Invalid { kind: TokenKind, reason: String },

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies HS256 access/refresh token pairs
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            &security.jwt_secret,
            Duration::seconds(security.access_token_ttl_secs),
            Duration::seconds(security.refresh_token_ttl_secs),
        )
    }

    /// Sign a short-lived access token and a long-lived refresh token for `identity`
    pub fn get_tokens(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(identity, false, self.access_ttl)?,
            refresh_token: self.sign(identity, true, self.refresh_ttl)?,
        })
    }

    fn sign(&self, identity: &Identity, is_refresh: bool, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            data: identity.clone(),
            is_refresh,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature and expiry. `kind` only labels the error message;
    /// whether the payload is actually a refresh token is the caller's call
    /// via `Claims::is_refresh`.
    pub fn verify_token(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired(kind),
                _ => TokenError::Invalid {
                    kind,
                    reason: e.to_string(),
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::minutes(5), Duration::days(1))
    }

    fn alice() -> Identity {
        Identity {
            id: "alice-id".to_string(),
            permission: Permission(3),
        }
    }

    #[test]
    fn pair_carries_identity_and_kind() {
        let tokens = service().get_tokens(&alice()).unwrap();

        let access = service().verify_token(&tokens.access_token, TokenKind::Access).unwrap();
        let refresh = service().verify_token(&tokens.refresh_token, TokenKind::Refresh).unwrap();

        assert_eq!(access.data, alice());
        assert!(!access.is_refresh);
        assert_eq!(refresh.data, alice());
        assert!(refresh.is_refresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let stale = TokenService::new("test-secret", Duration::seconds(-30), Duration::seconds(-30));
        let tokens = stale.get_tokens(&alice()).unwrap();

        let err = stale.verify_token(&tokens.access_token, TokenKind::Access).unwrap_err();
        assert_eq!(err, TokenError::Expired(TokenKind::Access));
        assert_eq!(err.to_string(), "access token has expired");
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let other = TokenService::new("another-secret", Duration::minutes(5), Duration::days(1));
        let tokens = other.get_tokens(&alice()).unwrap();

        let err = service().verify_token(&tokens.refresh_token, TokenKind::Refresh).unwrap_err();
        assert!(matches!(err, TokenError::Invalid { kind: TokenKind::Refresh, .. }));
    }

    #[test]
    fn garbage_is_invalid_not_a_panic() {
        let err = service().verify_token("not.a.jwt", TokenKind::Access).unwrap_err();
        assert!(err.to_string().starts_with("invalid access token"));
    }

    #[test]
    fn verifier_does_not_check_kind() {
        let tokens = service().get_tokens(&alice()).unwrap();
        let claims = service().verify_token(&tokens.access_token, TokenKind::Refresh).unwrap();
        assert!(!claims.is_refresh);
    }
}
