//! Firestore REST API client.
//!
//! Read-only client with:
//! - Service account or emulator authentication
//! - Token caching with refresh on expiry
//! - HTTP client tuning (pooling, timeouts)
//! - Optional exponential backoff with jitter
//! - Tracing spans per request

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::auth::Authenticator;
use crate::error::{FirestoreError, FirestoreResult};
use crate::paths;
use crate::retry::RetryConfig;
use crate::types::{
    Document, ListCollectionIdsRequest, ListCollectionIdsResponse, ListDocumentsResponse,
};

/// Production Firestore endpoint.
pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Database used when none is configured.
pub const DEFAULT_DATABASE_ID: &str = "(default)";

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID; read from the credentials file when unset
    pub project_id: Option<String>,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Service account key file
    pub credentials_file: Option<PathBuf>,
    /// `host:port` of a Firestore emulator; takes precedence over credentials
    pub emulator_host: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database_id: DEFAULT_DATABASE_ID.to_string(),
            credentials_file: None,
            emulator_host: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Self {
            project_id: non_empty("GCP_PROJECT_ID").or_else(|| non_empty("FIREBASE_PROJECT_ID")),
            database_id: non_empty("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            credentials_file: non_empty("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            emulator_host: non_empty("FIRESTORE_EMULATOR_HOST"),
            timeout: Duration::from_secs(secs("FIRESTORE_TIMEOUT_SECS", 30)),
            connect_timeout: Duration::from_secs(secs("FIRESTORE_CONNECT_TIMEOUT_SECS", 5)),
            retry: RetryConfig::from_env(),
        }
    }

    /// Endpoint requests are sent to.
    pub fn endpoint(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{}", host),
            None => FIRESTORE_ENDPOINT.to_string(),
        }
    }
}

/// Query parameters for one page of a collection listing.
#[derive(Debug, Clone, Default)]
pub struct ListDocumentsParams {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    /// Include placeholder entries for documents that only hold subcollections
    pub show_missing: bool,
}

impl ListDocumentsParams {
    fn query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(size) = self.page_size {
            params.push(format!("pageSize={}", size));
        }
        if let Some(token) = &self.page_token {
            params.push(format!("pageToken={}", urlencoding::encode(token)));
        }
        if self.show_missing {
            params.push("showMissing=true".to_string());
        }
        params.join("&")
    }
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    project_id: String,
    base_url: String,
    auth: Arc<Authenticator>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    ///
    /// Fails when no credentials are available or the project id cannot be
    /// determined.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let (auth, file_project_id) = if config.emulator_host.is_some() {
            (Authenticator::Emulator, None)
        } else {
            let path = config.credentials_file.as_deref().ok_or_else(|| {
                FirestoreError::auth_error(
                    "No credentials file given. Pass --credentials or set \
                     GOOGLE_APPLICATION_CREDENTIALS to a service account JSON file.",
                )
            })?;
            Authenticator::from_service_account_file(path)?
        };

        let project_id = config
            .project_id
            .clone()
            .or(file_project_id)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                FirestoreError::config(
                    "Project id is not set and the credentials file does not name one",
                )
            })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("fsdump-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let base_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            config.endpoint(),
            project_id,
            config.database_id
        );

        debug!(base_url = %base_url, "Firestore client ready");

        Ok(Self {
            http,
            config,
            project_id,
            base_url,
            auth: Arc::new(auth),
        })
    }

    /// Resolved project id.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Database id.
    pub fn database_id(&self) -> &str {
        &self.config.database_id
    }

    fn resource_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, paths::encode_for_url(path))
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Get a document by path. Returns `None` when it does not exist.
    pub async fn get_document(&self, path: &str) -> FirestoreResult<Option<Document>> {
        paths::validate_document_path(path)?;
        let url = self.resource_url(path);

        self.with_retry("get_document", || {
            self.execute_request("get_document", path, async {
                let response = self.send(|token| self.http.get(&url).bearer_auth(token)).await?;

                match response.status() {
                    StatusCode::OK => Ok(Some(response.json::<Document>().await?)),
                    StatusCode::NOT_FOUND => Ok(None),
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    /// List one page of documents in a collection.
    pub async fn list_documents(
        &self,
        collection_path: &str,
        params: &ListDocumentsParams,
    ) -> FirestoreResult<ListDocumentsResponse> {
        paths::validate_collection_path(collection_path)?;
        let mut url = self.resource_url(collection_path);
        let query = params.query_string();
        if !query.is_empty() {
            url = format!("{}?{}", url, query);
        }

        self.with_retry("list_documents", || {
            self.execute_request("list_documents", collection_path, async {
                let response = self.send(|token| self.http.get(&url).bearer_auth(token)).await?;

                match response.status() {
                    StatusCode::OK => {
                        let list: ListDocumentsResponse = response.json().await?;
                        debug!(
                            collection = %collection_path,
                            returned = list.documents.as_ref().map(|d| d.len()).unwrap_or(0),
                            "Listed documents"
                        );
                        Ok(list)
                    }
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    /// List one page of the subcollection ids under a document.
    pub async fn list_collection_ids(
        &self,
        document_path: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> FirestoreResult<ListCollectionIdsResponse> {
        paths::validate_document_path(document_path)?;
        let url = format!("{}:listCollectionIds", self.resource_url(document_path));
        let request = ListCollectionIdsRequest {
            page_size,
            page_token: page_token.map(str::to_string),
        };

        self.with_retry("list_collection_ids", || {
            self.execute_request("list_collection_ids", document_path, async {
                let response = self
                    .send(|token| self.http.post(&url).bearer_auth(token).json(&request))
                    .await?;

                match response.status() {
                    StatusCode::OK => Ok(response.json::<ListCollectionIdsResponse>().await?),
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    /// List every subcollection id under a document, following page tokens.
    pub async fn list_all_collection_ids(&self, document_path: &str) -> FirestoreResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_collection_ids(document_path, None, page_token.as_deref())
                .await?;
            ids.extend(page.collection_ids.unwrap_or_default());

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ids)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send an authorized request, refreshing the token once if it expired.
    async fn send<F>(&self, build: F) -> FirestoreResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.auth.token().await?;
        let response = build(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(FirestoreError::auth_error(body));
        }

        debug!("Access token rejected as expired, refreshing");
        self.auth.invalidate().await;
        let token = self.auth.token().await?;
        Ok(build(&token).send().await?)
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, op: F) -> FirestoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = FirestoreResult<T>>,
    {
        crate::retry::with_retry(&self.config.retry, operation, op).await
    }

    /// Execute a request inside a tracing span and log its outcome.
    async fn execute_request<T, F>(&self, operation: &str, path: &str, fut: F) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = info_span!("firestore_request", operation = %operation, path = %path);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        debug!(operation = %operation, path = %path, status, latency_ms, "Firestore request finished");

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            if let Some(secs) = retry_after {
                return FirestoreError::RateLimited(secs.saturating_mul(1000));
            }
        }
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

// =============================================================================
// Tests
// =============================================================================
