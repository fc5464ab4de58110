//! Admin credentials and bearer tokens.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{models::AdminEntity, platform::config::AuthConfig};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct AdminClaims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub exp: i64,
}

pub fn issue_token(admin: &AdminEntity, auth: &AuthConfig) -> Result<String> {
    let claims = AdminClaims {
        sub: admin.id,
        username: admin.username.clone(),
        role: admin.role.clone(),
        exp: (Utc::now() + Duration::hours(auth.token_ttl_hours)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .context("Failed to sign admin token")
}

/// Returns the claims of a valid, unexpired token.
pub fn verify_token(token: &str, auth: &AuthConfig) -> Option<AdminClaims> {
    jsonwebtoken::decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .ok()
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.into(),
            token_ttl_hours: 24,
        }
    }

    fn admin() -> AdminEntity {
        AdminEntity {
            id: Uuid::new_v4(),
            username: "owner".into(),
            password_hash: String::new(),
            role: "owner".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let admin = admin();
        let token = issue_token(&admin, &auth("secret")).unwrap();
        let claims = verify_token(&token, &auth("secret")).unwrap();

        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.username, "owner");
        assert_eq!(claims.role, "owner");
        let ttl = claims.exp - Utc::now().timestamp();
        assert!((23 * 3600..=24 * 3600).contains(&ttl));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue_token(&admin(), &auth("secret")).unwrap();

        assert!(verify_token(&token, &auth("other")).is_none());
        assert!(verify_token("not-a-jwt", &auth("secret")).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = AuthConfig {
            jwt_secret: "secret".into(),
            token_ttl_hours: -2,
        };
        let token = issue_token(&admin(), &expired).unwrap();

        assert!(verify_token(&token, &auth("secret")).is_none());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = bcrypt::hash("hunter22", 4).unwrap();

        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "garbage"));
    }
}
