//! Schema-typed adapter speaking the Connect unary protocol with JSON codecs.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{CreateEntryRequest, CreateEntryResponse},
};
use tracing::{debug, info, warn};
use url::Url;

use super::{endpoint_url, EntryTransport, RequestDecorator};
use crate::{credentials::CredentialSource, error::ClientError};

pub const DEFAULT_CONNECT_SERVICE: &str = "entry.EntryService";

const CONNECT_PROTOCOL_VERSION_HEADER: &str = "connect-protocol-version";
const CONNECT_TIMEOUT_HEADER: &str = "connect-timeout-ms";

pub struct ConnectEntryClient {
    http: Client,
    base_url: Url,
    service: String,
    decorator: RequestDecorator,
    timeout: Option<Duration>,
}

impl ConnectEntryClient {
    pub fn new(base_url: Url, credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    pub fn with_client(http: Client, base_url: Url, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            http,
            base_url,
            service: DEFAULT_CONNECT_SERVICE.to_string(),
            decorator: RequestDecorator::new(credentials).with_default_header(
                HeaderName::from_static(CONNECT_PROTOCOL_VERSION_HEADER),
                HeaderValue::from_static("1"),
            ),
            timeout: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Advertised to the server as the call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn procedure_url(&self, method: &str) -> Result<Url, ClientError> {
        let service = self.service.trim_matches('/');
        endpoint_url(&self.base_url, &format!("/{service}/{method}"))
    }

    pub async fn unary<Req, Res>(&self, method: &str, message: &Req) -> Result<Res, ClientError>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned,
    {
        let url = self.procedure_url(method)?;

        let mut call_headers = HeaderMap::new();
        if let Some(timeout) = self.timeout {
            if let Ok(value) = HeaderValue::from_str(&timeout.as_millis().to_string()) {
                call_headers.insert(HeaderName::from_static(CONNECT_TIMEOUT_HEADER), value);
            }
        }

        let (builder, request_id) = self
            .decorator
            .decorate(self.http.post(url.clone()), Some(&call_headers))?;

        debug!(%url, %request_id, procedure = method, "sending connect call");
        let started = Instant::now();
        let response = match builder.json(message).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, %request_id, procedure = method, error = %err, "connect call failed");
                return Err(err.into());
            }
        };

        let status = response.status();
        let body = response.bytes().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            let err = decode_error(status, &body);
            warn!(%url, %request_id, procedure = method, status = status.as_u16(), elapsed_ms, error = %err, "connect call returned error");
            return Err(err);
        }

        let parsed = serde_json::from_slice::<Res>(&body).map_err(|err| {
            ClientError::MalformedResponse(format!("body could not be decoded: {err}"))
        })?;
        info!(%url, %request_id, procedure = method, elapsed_ms, "connect call completed");
        Ok(parsed)
    }
}

/// Structured error from a failed call. Bodies that are not Connect errors
/// (proxies, load balancers) fall back to a code derived from the HTTP status.
fn decode_error(status: StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(api_error) => ClientError::Remote {
            code: api_error.code,
            message: api_error.message,
        },
        Err(_) => ClientError::Remote {
            code: ErrorCode::from_http_status(status.as_u16()),
            message: String::new(),
        },
    }
}

#[async_trait]
impl EntryTransport for ConnectEntryClient {
    fn name(&self) -> &'static str {
        "connect"
    }

    async fn create_entry(
        &self,
        request: &CreateEntryRequest,
    ) -> Result<CreateEntryResponse, ClientError> {
        self.unary("CreateEntry", request).await
    }
}
