//! Google ID-token verification.
//!
//! Tokens are RS256 JWTs signed with one of Google's rotating keys, published
//! as a JWKS document. Keys are cached and refetched when an unknown `kid`
//! shows up or the cache is older than [`JWKS_CACHE_TTL`].

use crate::error::{HiringError, HiringResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: &[&str] = &["accounts.google.com", "https://accounts.google.com"];
const JWKS_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// A verified Google account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync {
    /// Verifies an ID token. Invalid tokens yield `Unauthorized`, tokens for
    /// unverified emails yield `InvalidRequest`.
    async fn verify(&self, id_token: &str) -> HiringResult<GoogleIdentity>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

fn identity_from_claims(claims: GoogleClaims) -> HiringResult<GoogleIdentity> {
    let email = claims
        .email
        .ok_or_else(|| HiringError::Unauthorized("ID token carries no email".to_string()))?;
    if claims.email_verified != Some(true) {
        return Err(HiringError::InvalidRequest(
            "Email is not verified by Google".to_string(),
        ));
    }
    Ok(GoogleIdentity {
        name: claims.name.unwrap_or_else(|| email.clone()),
        email,
        picture: claims.picture,
    })
}

/// HTTP client for JWKS requests
fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")
}

pub struct JwksGoogleVerifier {
    client_id: String,
    jwks_url: String,
    http: reqwest::Client,
    cache: RwLock<Option<(JwkSet, Instant)>>,
}

impl JwksGoogleVerifier {
    pub fn new(client_id: String, jwks_url: Option<String>) -> Result<Self> {
        info!("Google sign-in enabled for client id {}", client_id);
        Ok(Self {
            client_id,
            jwks_url: jwks_url.unwrap_or_else(|| GOOGLE_JWKS_URL.to_string()),
            http: http_client()?,
            cache: RwLock::new(None),
        })
    }

    async fn fetch_jwks(&self) -> Result<JwkSet> {
        debug!("Fetching Google JWKS from {}", self.jwks_url);
        let jwks = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .context("Failed to fetch JWKS")?
            .error_for_status()
            .context("JWKS endpoint returned an error")?
            .json::<JwkSet>()
            .await
            .context("Failed to parse JWKS")?;
        Ok(jwks)
    }

    async fn decoding_key(&self, kid: &str) -> Result<Option<DecodingKey>> {
        {
            let cache = self.cache.read().await;
            if let Some((jwks, fetched_at)) = cache.as_ref() {
                if fetched_at.elapsed() < JWKS_CACHE_TTL {
                    if let Some(jwk) = jwks.find(kid) {
                        return Ok(Some(DecodingKey::from_jwk(jwk)?));
                    }
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        let key = jwks.find(kid).map(DecodingKey::from_jwk).transpose()?;
        *self.cache.write().await = Some((jwks, Instant::now()));
        Ok(key)
    }
}

#[async_trait]
impl GoogleTokenVerifier for JwksGoogleVerifier {
    async fn verify(&self, id_token: &str) -> HiringResult<GoogleIdentity> {
        let invalid = |reason: &str| HiringError::Unauthorized(format!("Invalid ID token: {}", reason));

        let header = decode_header(id_token).map_err(|e| invalid(&e.to_string()))?;
        let kid = header.kid.ok_or_else(|| invalid("missing key id"))?;
        let key = self
            .decoding_key(&kid)
            .await?
            .ok_or_else(|| invalid("unknown signing key"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(GOOGLE_ISSUERS);
        let data = decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| invalid(&e.to_string()))?;

        identity_from_claims(data.claims)
    }
}
