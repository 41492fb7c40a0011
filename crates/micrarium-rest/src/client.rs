//! HTTP client for the hosted data service.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use micrarium_core::error::{Error, ServiceError, TransportError};
use micrarium_core::{Result, StoreUrl};

/// Credentials for the hosted data service.
///
/// The project API key is always sent; a user JWT, when present, rides
/// in the bearer slot so the service's row-level security sees the
/// user rather than the anonymous role.
#[derive(Debug, Clone)]
pub struct RestAuth {
    api_key: String,
    bearer: Option<String>,
}

impl RestAuth {
    /// Anonymous access with the project API key.
    pub fn anonymous(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            bearer: None,
        }
    }

    /// Authenticated access with a user token on top of the API key.
    pub fn bearer(api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            bearer: Some(token.into()),
        }
    }

    fn bearer_token(&self) -> &str {
        self.bearer.as_deref().unwrap_or(&self.api_key)
    }
}

fn map_reqwest(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Transport(TransportError::Timeout { duration_ms: 0 })
    } else if err.is_connect() {
        Error::Transport(TransportError::Connection {
            message: err.to_string(),
        })
    } else {
        Error::Transport(TransportError::Http {
            message: err.to_string(),
        })
    }
}

/// Error body returned by the data service.
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// HTTP client for PostgREST-style table endpoints.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    store: StoreUrl,
    auth: RestAuth,
}

impl RestClient {
    /// Create a new client for the given store.
    pub fn new(store: StoreUrl, auth: RestAuth) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("micrarium/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            store,
            auth,
        }
    }

    /// Returns the store URL this client is configured for.
    pub fn store(&self) -> &StoreUrl {
        &self.store
    }

    /// Select rows from a table (GET request).
    #[instrument(skip(self), fields(store = %self.store))]
    pub async fn select<R>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<R>>
    where
        R: DeserializeOwned,
    {
        let url = self.store.table_url(table);
        debug!(table, "Selecting rows");
        trace!(?query, "query parameters");

        let response = self
            .client
            .get(&url)
            .query(query)
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(map_reqwest)?;

        self.handle_response(response).await
    }

    /// Count matching rows without fetching them (HEAD request).
    ///
    /// The service reports the exact total in the `content-range`
    /// header when asked with `Prefer: count=exact`.
    #[instrument(skip(self), fields(store = %self.store))]
    pub async fn count(&self, table: &str, query: &[(&str, String)]) -> Result<u64> {
        let url = self.store.table_url(table);
        debug!(table, "Counting rows");

        let response = self
            .client
            .head(&url)
            .query(query)
            .headers(self.auth_headers())
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Service(self.parse_error_response(response).await));
        }

        let header = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        parse_content_range(header).ok_or_else(|| {
            Error::Service(ServiceError::new(
                status.as_u16(),
                None,
                Some(format!(
                    "missing or malformed content-range header: '{}'",
                    header
                )),
            ))
        })
    }

    /// Patch matching rows (PATCH request, no representation returned).
    #[instrument(skip(self, body), fields(store = %self.store))]
    pub async fn patch(&self, table: &str, query: &[(&str, String)], body: &Value) -> Result<()> {
        let url = self.store.table_url(table);
        debug!(table, "Patching rows");

        let response = self
            .client
            .patch(&url)
            .query(query)
            .headers(self.auth_headers())
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Service(self.parse_error_response(response).await))
        }
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.auth.api_key).expect("invalid api key characters"),
        );
        let bearer = format!("Bearer {}", self.auth.bearer_token());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).expect("invalid token characters"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Handle a service response, parsing the body or error.
    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "Service response");

        if status.is_success() {
            response.json::<R>().await.map_err(map_reqwest)
        } else {
            Err(Error::Service(self.parse_error_response(response).await))
        }
    }

    /// Parse a service error response.
    async fn parse_error_response(&self, response: reqwest::Response) -> ServiceError {
        let status = response.status().as_u16();

        // Try to parse as the service's error format
        match response.json::<RestErrorBody>().await {
            Ok(body) => ServiceError::new(status, body.code, body.message),
            Err(_) => ServiceError::new(status, None, None),
        }
    }
}

/// Parse the total from a `content-range` header (`0-11/25` or `*/25`).
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}
