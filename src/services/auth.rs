use crate::config::AuthConfig;
use crate::constants::ADMIN_SUBJECT;
use crate::error::{AppError, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Response body of `POST /admin/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminToken {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

/// Verifies the admin password and issues/validates HS256 session tokens.
#[derive(Clone)]
pub struct AdminAuth {
    password_hash: Arc<str>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_seconds: u64,
}

impl AdminAuth {
    pub fn new(config: &AuthConfig) -> Self {
        AdminAuth {
            password_hash: Arc::from(config.admin_password_hash.as_str()),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl_seconds: config.token_ttl_seconds,
        }
    }

    /// Exchange the admin password for a token. Any mismatch is a plain 401.
    /// Surrounding whitespace is ignored, as it is when the hash is built.
    pub async fn login(&self, password: &str) -> Result<AdminToken> {
        let candidate = password.trim().to_string();
        if candidate.is_empty() {
            return Err(AppError::Unauthorized("Invalid admin password".to_string()));
        }
        let hash = self.password_hash.clone();

        // CPU-bound
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Stored admin hash is invalid: {}", e)))?;

        if !verified {
            tracing::warn!("Rejected admin login with wrong password");
            return Err(AppError::Unauthorized("Invalid admin password".to_string()));
        }

        let token = self.issue(OffsetDateTime::now_utc())?;
        tracing::info!("Issued admin token");
        Ok(AdminToken {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl_seconds,
        })
    }

    fn issue(&self, now: OffsetDateTime) -> Result<String> {
        let iat = now.unix_timestamp();
        let claims = AdminClaims {
            sub: ADMIN_SUBJECT.to_string(),
            iat,
            exp: iat.saturating_add(self.token_ttl_seconds as i64),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign admin token: {}", e)))
    }

    /// Validate signature, expiry and subject of a bearer token.
    pub fn verify(&self, token: &str) -> Result<AdminClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<AdminClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Admin token rejected: {}", e);
                AppError::Unauthorized("Invalid or expired admin token".to_string())
            })?;

        if claims.sub != ADMIN_SUBJECT {
            return Err(AppError::Unauthorized(
                "Invalid or expired admin token".to_string(),
            ));
        }
        Ok(claims)
    }
}
