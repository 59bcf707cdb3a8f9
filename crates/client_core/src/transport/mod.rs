//! Remote client capability and the adapters that implement it.
//!
//! The submission controller only ever sees [`EntryTransport`]; which adapter
//! sits behind it is decided once, when the client is built.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    RequestBuilder,
};
use shared::protocol::{CreateEntryRequest, CreateEntryResponse};
use url::Url;
use uuid::Uuid;

use crate::{credentials::CredentialSource, error::ClientError};

pub mod connect;
pub mod http;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[async_trait]
pub trait EntryTransport: Send + Sync {
    /// Short adapter name used in logs.
    fn name(&self) -> &'static str;

    async fn create_entry(
        &self,
        request: &CreateEntryRequest,
    ) -> Result<CreateEntryResponse, ClientError>;
}

/// Applies default headers, caller headers, the bearer credential and a fresh
/// request id to an outgoing request, in that order.
pub struct RequestDecorator {
    default_headers: HeaderMap,
    credentials: Arc<dyn CredentialSource>,
}

impl RequestDecorator {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            default_headers,
            credentials,
        }
    }

    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Returns the decorated builder and the request id it was tagged with.
    pub fn decorate(
        &self,
        builder: RequestBuilder,
        extra: Option<&HeaderMap>,
    ) -> Result<(RequestBuilder, String), ClientError> {
        let mut headers = self.default_headers.clone();
        if let Some(extra) = extra {
            for (name, value) in extra {
                headers.insert(name.clone(), value.clone());
            }
        }

        if let Some(token) = self.credentials.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::Config("stored credential is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let request_id = Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }

        Ok((builder.headers(headers), request_id))
    }
}

/// Joins a base address and an endpoint path by concatenation, so a base with
/// a path prefix keeps it.
pub fn endpoint_url(base: &Url, endpoint: &str) -> Result<Url, ClientError> {
    let base = base.as_str().trim_end_matches('/');
    let joined = if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    };
    Url::parse(&joined)
        .map_err(|err| ClientError::Config(format!("invalid endpoint URL '{joined}': {err}")))
}
