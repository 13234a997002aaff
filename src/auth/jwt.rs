//! HS512 access and refresh tokens.

use crate::store::User;
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ACCESS_TOKEN_VALIDITY_SECS: i64 = 24 * 60 * 60;
pub const DEFAULT_REFRESH_TOKEN_VALIDITY_SECS: i64 = 100 * 24 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// User summary embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user's email.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub user: TokenUser,
    pub kind: TokenKind,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_validity_secs: i64,
    refresh_validity_secs: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], access_validity_secs: i64, refresh_validity_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_validity_secs,
            refresh_validity_secs,
        }
    }

    /// Builds the service from a base64-encoded secret.
    pub fn from_base64_secret(
        secret: &str,
        access_validity_secs: i64,
        refresh_validity_secs: i64,
    ) -> Result<Self> {
        let bytes = STANDARD
            .decode(secret.trim())
            .context("JWT secret is not valid base64")?;
        if bytes.is_empty() {
            bail!("JWT secret must not be empty");
        }
        Ok(Self::new(&bytes, access_validity_secs, refresh_validity_secs))
    }

    pub fn refresh_validity_secs(&self) -> i64 {
        self.refresh_validity_secs
    }

    fn create_token(&self, user: &User, kind: TokenKind, validity_secs: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.email.clone(),
            iat: now,
            exp: now + validity_secs,
            user: TokenUser {
                id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
            },
            kind,
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    pub fn create_access_token(&self, user: &User) -> Result<String> {
        self.create_token(user, TokenKind::Access, self.access_validity_secs)
    }

    pub fn create_refresh_token(&self, user: &User) -> Result<String> {
        self.create_token(user, TokenKind::Refresh, self.refresh_validity_secs)
    }

    fn decode_token(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(ALGORITHM))
            .context("Invalid token")?;
        if data.claims.kind != expected {
            bail!("Expected {:?} token, got {:?}", expected, data.claims.kind);
        }
        Ok(data.claims)
    }

    pub fn decode_access_token(&self, token: &str) -> Result<Claims> {
        self.decode_token(token, TokenKind::Access)
    }

    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims> {
        self.decode_token(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserRole;

    fn test_user() -> User {
        User {
            id: 42,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            age: None,
            gender: None,
            address: None,
            avatar: None,
            cv: None,
            role: UserRole::Candidate,
            company: None,
            active: true,
            created_at: 0,
            updated_at: None,
            password_hash: None,
            refresh_token: None,
        }
    }

    fn service() -> TokenService {
        TokenService::new(
            b"a-test-secret-that-is-long-enough",
            DEFAULT_ACCESS_TOKEN_VALIDITY_SECS,
            DEFAULT_REFRESH_TOKEN_VALIDITY_SECS,
        )
    }

    #[test]
    fn access_token_round_trip() {
        let service = service();
        let token = service.create_access_token(&test_user()).unwrap();
        let claims = service.decode_access_token(&token).unwrap();
        assert_eq!(claims.sub, "ada@example.com");
        assert_eq!(claims.user.id, 42);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, DEFAULT_ACCESS_TOKEN_VALIDITY_SECS);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let service = service();
        let access = service.create_access_token(&test_user()).unwrap();
        let refresh = service.create_refresh_token(&test_user()).unwrap();
        assert!(service.decode_refresh_token(&access).is_err());
        assert!(service.decode_access_token(&refresh).is_err());
        assert!(service.decode_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn rejects_expired_and_foreign_tokens() {
        let expired = TokenService::new(b"secret-one", -3600, -3600);
        let token = expired.create_access_token(&test_user()).unwrap();
        assert!(expired.decode_access_token(&token).is_err());

        let other = TokenService::new(b"secret-two", 60, 60);
        let token = other.create_access_token(&test_user()).unwrap();
        assert!(service().decode_access_token(&token).is_err());
        assert!(service().decode_access_token("garbage").is_err());
    }

    #[test]
    fn base64_secret_is_required() {
        assert!(TokenService::from_base64_secret("not base64!!", 1, 1).is_err());
        assert!(TokenService::from_base64_secret("", 1, 1).is_err());
        let encoded = STANDARD.encode(b"0123456789abcdef");
        assert!(TokenService::from_base64_secret(&encoded, 1, 1).is_ok());
    }
}
