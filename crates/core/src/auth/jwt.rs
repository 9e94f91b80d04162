//! Bearer token authentication with HS256 JWTs.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthRequest, Authenticator, Identity, Role};

/// Claims carried by issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Issues and verifies signed bearer tokens.
///
/// Accepts the token in the `Authorization: Bearer <token>` header.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::ConfigurationError(
                "jwt_secret must not be empty".to_string(),
            ));
        }
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                AuthError::ConfigurationError(format!("token_ttl_secs out of range: {}", ttl_secs))
            })?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Issue a token for a user.
    pub fn issue_token(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            AuthError::ConfigurationError("token expiry overflows the calendar".to_string())
        })?;
        let claims = TokenClaims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ConfigurationError(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))
    }

    fn extract_token(request: &AuthRequest) -> Option<&str> {
        let header = request.headers.get("authorization")?;
        header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let token = Self::extract_token(request).ok_or(AuthError::NotAuthenticated)?;
        let claims = self.verify_token(token)?;

        Ok(Identity::new(claims.sub, claims.role, self.method_name()))
    }

    fn method_name(&self) -> &'static str {
        "jwt"
    }
}
