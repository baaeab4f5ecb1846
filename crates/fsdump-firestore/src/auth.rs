//! Bearer tokens for Firestore requests.
//!
//! Two modes:
//! - Service account: OAuth tokens from gcp_auth, cached until shortly
//!   before they expire
//! - Emulator: the emulator accepts a fixed `owner` token

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for Firestore/Datastore access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Token the Firestore emulator treats as an admin credential.
pub const EMULATOR_TOKEN: &str = "owner";

/// Source of bearer tokens for a client.
pub(crate) enum Authenticator {
    ServiceAccount(TokenCache),
    Emulator,
}

impl Authenticator {
    /// Load a service account key file.
    ///
    /// Returns the authenticator and the project id recorded in the file.
    pub(crate) fn from_service_account_file(path: &Path) -> FirestoreResult<(Self, Option<String>)> {
        let account = CustomServiceAccount::from_file(path).map_err(|e| {
            FirestoreError::auth_error(format!(
                "Failed to load service account {}: {}",
                path.display(),
                e
            ))
        })?;
        let project_id = account.project_id().map(str::to_string);
        let cache = TokenCache::new(Arc::new(account));
        Ok((Self::ServiceAccount(cache), project_id))
    }

    pub(crate) async fn token(&self) -> FirestoreResult<String> {
        match self {
            Self::ServiceAccount(cache) => cache.get_token().await,
            Self::Emulator => Ok(EMULATOR_TOKEN.to_string()),
        }
    }

    /// Drop any cached token so the next call fetches a fresh one.
    pub(crate) async fn invalidate(&self) {
        if let Self::ServiceAccount(cache) = self {
            cache.invalidate().await;
        }
    }
}

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Token cache over a gcp_auth provider.
pub(crate) struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub(crate) fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(None),
        }
    }

    async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Get a valid access token, refreshing if necessary.
    async fn get_token(&self) -> FirestoreResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
            return Ok(cached.access_token.clone());
        }

        match self.provider.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();
                let expires_at = expiry_instant(token.expires_at());
                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });
                debug!("Refreshed Firestore auth token");
                Ok(access_token)
            }
            Err(e) => {
                // A refresh failure is tolerable while the old token still works
                if let Some(cached) = cache.as_ref().filter(|c| c.is_usable()) {
                    warn!("Token refresh failed, using existing token: {}", e);
                    return Ok(cached.access_token.clone());
                }
                Err(FirestoreError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}

/// Convert a wall-clock expiry into a monotonic deadline.
fn expiry_instant(expires_at: chrono::DateTime<Utc>) -> Instant {
    let now = Utc::now();
    if expires_at <= now {
        // already expired: force a refresh on the next request
        return Instant::now();
    }
    match (expires_at - now).to_std() {
        Ok(ttl) => Instant::now() + ttl,
        Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_token_refresh_margin() {
        assert_eq!(TOKEN_REFRESH_MARGIN, Duration::from_secs(60));
    }

    #[test]
    fn test_firestore_scope() {
        assert!(FIRESTORE_SCOPE.contains("datastore"));
    }

    #[test]
    fn test_expired_token_gets_immediate_deadline() {
        let deadline = expiry_instant(Utc::now() - chrono::Duration::seconds(5));
        assert!(deadline <= Instant::now());
    }

    #[test]
    fn test_future_expiry_is_honoured() {
        let deadline = expiry_instant(Utc::now() + chrono::Duration::minutes(10));
        let remaining = deadline.saturating_duration_since(Instant::now());
        assert!(remaining > Duration::from_secs(9 * 60));
        assert!(remaining <= Duration::from_secs(10 * 60));
    }

    #[tokio::test]
    async fn test_emulator_token() {
        let auth = Authenticator::Emulator;
        assert_eq!(auth.token().await.unwrap(), EMULATOR_TOKEN);
        auth.invalidate().await;
        assert_eq!(auth.token().await.unwrap(), EMULATOR_TOKEN);
    }

    #[test]
    fn test_missing_key_file_is_auth_error() {
        let result = Authenticator::from_service_account_file(Path::new("/nonexistent/key.json"));
        assert!(matches!(result, Err(FirestoreError::AuthError(_))));
    }

    #[test]
    fn test_malformed_key_file_is_auth_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"type\": \"service_account\"}").unwrap();
        let result = Authenticator::from_service_account_file(file.path());
        assert!(matches!(result, Err(FirestoreError::AuthError(_))));
    }
}
