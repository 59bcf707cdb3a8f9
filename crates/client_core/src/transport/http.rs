//! Generic JSON-over-HTTP wrapper.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use shared::protocol::{CreateEntryRequest, CreateEntryResponse};
use tracing::{debug, info, warn};
use url::Url;

use super::{endpoint_url, EntryTransport, RequestDecorator};
use crate::{credentials::CredentialSource, error::ClientError};

pub const DEFAULT_ENTRIES_PATH: &str = "/entries";

pub struct ApiClient {
    http: Client,
    base_url: Url,
    decorator: RequestDecorator,
    entries_path: String,
}

impl ApiClient {
    pub fn new(base_url: Url, credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    pub fn with_client(http: Client, base_url: Url, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            http,
            base_url,
            decorator: RequestDecorator::new(credentials),
            entries_path: DEFAULT_ENTRIES_PATH.to_string(),
        }
    }

    pub fn with_entries_path(mut self, path: impl Into<String>) -> Self {
        self.entries_path = path.into();
        self
    }

    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        headers: Option<&HeaderMap>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = endpoint_url(&self.base_url, endpoint)?;
        let (mut builder, request_id) = self
            .decorator
            .decorate(self.http.request(method.clone(), url.clone()), headers)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(%method, %url, %request_id, "sending api request");
        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, %url, %request_id, error = %err, "api request failed");
                return Err(err.into());
            }
        };

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !status.is_success() {
            warn!(%method, %url, %request_id, status = status.as_u16(), elapsed_ms, "api request returned error status");
            return Err(ClientError::http_status(status));
        }

        let parsed = response.json::<T>().await?;
        info!(%method, %url, %request_id, status = status.as_u16(), elapsed_ms, "api request completed");
        Ok(parsed)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::GET, endpoint, None, None).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body), None).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, Some(body), None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::DELETE, endpoint, None, None).await
    }
}

#[async_trait]
impl EntryTransport for ApiClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn create_entry(
        &self,
        request: &CreateEntryRequest,
    ) -> Result<CreateEntryResponse, ClientError> {
        self.post(&self.entries_path, request).await
    }
}
