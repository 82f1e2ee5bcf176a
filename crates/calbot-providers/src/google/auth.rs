//! Service-account authentication.
//!
//! The backend authenticates as a Google service account: it signs a short
//! RS256 JWT with the account's private key and exchanges it at the token
//! endpoint for a bearer access token. Tokens are cached and refreshed
//! [`REFRESH_SKEW_SECS`] seconds before they expire.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::store::BoxFuture;

/// Google's OAuth token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this many seconds before the cached token expires.
pub const REFRESH_SKEW_SECS: i64 = 60;

/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account JSON key that signing needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Reads and validates a key file.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read service account key {}: {e}",
                path.display()
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let key: Self = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("invalid service account key: {e}")).with_source(e)
        })?;

        match key.key_type.as_deref() {
            None | Some("service_account") => {}
            Some(kind) => {
                return Err(ProviderError::configuration(format!(
                    "expected a service_account key, got '{kind}'"
                )));
            }
        }
        if key.client_email.trim().is_empty() {
            return Err(ProviderError::configuration("service account key has no client_email"));
        }
        if key.private_key.trim().is_empty() {
            return Err(ProviderError::configuration("service account key has no private_key"));
        }
        Ok(key)
    }
}

/// Something that can hand out a bearer token for the Calendar API.
pub trait AccessTokenSource: Send + Sync {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>>;
}

/// A fixed token, for tests and for tokens minted elsewhere.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl AccessTokenSource for StaticToken {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        let token = self.0.clone();
        Box::pin(async move { Ok(token) })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_SKEW_SECS) < self.expires_at
    }
}

#[derive(Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges signed assertions for access tokens and caches the result.
#[derive(Debug)]
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    token_uri: String,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, scopes: Vec<String>, http: reqwest::Client) -> Self {
        Self {
            token_uri: key.token_uri.clone(),
            key,
            scopes,
            http,
            cached: RwLock::new(None),
        }
    }

    /// Sends token requests to `uri` instead of the key's `token_uri`.
    ///
    /// The assertion audience follows, since Google checks that they match.
    #[must_use]
    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri = uri.into();
        self
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signs an assertion issued at `now`.
    pub(crate) fn build_assertion(&self, now: DateTime<Utc>) -> ProviderResult<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes()).map_err(|e| {
            ProviderError::configuration(format!("invalid service account private key: {e}")).with_source(e)
        })?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| ProviderError::internal(format!("failed to sign assertion: {e}")).with_source(e))
    }

    async fn fetch_token(&self, assertion: &str) -> ProviderResult<CachedToken> {
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)])
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read token response: {e}")))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "token exchange failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("invalid token response: {e}")))?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }

    /// Returns a valid token, refreshing it when close to expiry.
    pub async fn token(&self) -> ProviderResult<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.access_token.clone());
        }

        debug!(account = %self.key.client_email, "requesting access token");
        let assertion = self.build_assertion(Utc::now())?;
        let token = self.fetch_token(&assertion).await?;
        info!(
            account = %self.key.client_email,
            expires_at = %token.expires_at,
            "obtained access token"
        );

        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}

impl AccessTokenSource for ServiceAccountTokenSource {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(self.token())
    }
}
