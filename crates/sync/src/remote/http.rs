//! `reqwest` implementation of [`RemoteClient`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tally_core::{Product, Purchase};
use tracing::instrument;
use url::Url;

use super::RemoteClient;
use crate::error::RemoteError;

/// Base endpoint of the inventory service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Maximum number of body characters kept in logs and errors.
const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client for the inventory service.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    /// Always ends with `/` so relative joins keep the path prefix.
    base_url: Url,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a client for the service at `base_url`
    /// (e.g. `http://localhost:5000/api`).
    ///
    /// `connect_timeout` bounds connection setup only; request deadlines are
    /// enforced by the stores.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::InvalidUrl` if `base_url` does not parse, or
    /// `RemoteError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str, connect_timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                client: builder.build()?,
                base_url,
            }),
        })
    }

    /// The normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = self.endpoint(path)?;
        let response = self.inner.client.get(url).send().await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.inner.client.post(url).json(body).send().await?;
        decode(response).await
    }
}

/// Check the status and decode the JSON body of a response.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
    let status = response.status();
    let url = response.url().clone();

    // Body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            url = %url,
            body = %preview(&body),
            "Inventory service returned non-success status"
        );
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body: preview(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            url = %url,
            body = %preview(&body),
            "Failed to parse inventory service response"
        );
        RemoteError::Parse(e)
    })
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[async_trait]
impl RemoteClient for HttpClient {
    #[instrument(skip(self), fields(base_url = %self.inner.base_url))]
    async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        self.get_json("products").await
    }

    #[instrument(skip(self), fields(base_url = %self.inner.base_url))]
    async fn list_purchases(&self) -> Result<Vec<Purchase>, RemoteError> {
        self.get_json("purchases").await
    }

    #[instrument(skip(self, purchase), fields(base_url = %self.inner.base_url, items = purchase.items.len()))]
    async fn create_purchase(&self, purchase: &Purchase) -> Result<Purchase, RemoteError> {
        let created: Purchase = self.post_json("purchases", purchase).await?;
        if !created.is_confirmed() {
            tracing::error!("Created purchase came back without an identifier");
            return Err(RemoteError::MissingIdentifier);
        }
        Ok(created)
    }
}
