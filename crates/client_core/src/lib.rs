use std::sync::Arc;

use reqwest::Client;
use tracing::info;

pub mod config;
pub mod credentials;
pub mod error;
pub mod form;
pub mod submission;
pub mod transport;

pub use config::{load_settings, ClientSettings, DeploymentMode, TransportKind};
pub use credentials::{CredentialSource, EnvToken, NoCredentials, StaticToken, TokenFile};
pub use error::{ClientError, ValidationError};
pub use form::{Draft, DraftField, FieldError, FieldStore};
pub use submission::{EntryCreatedCallback, SubmissionController, SubmissionStatus};
pub use transport::{
    connect::ConnectEntryClient, http::ApiClient, EntryTransport, RequestDecorator,
};

/// Builds the remote client selected by `settings`. The base address and the
/// adapter are fixed here for the lifetime of the returned transport.
pub fn build_transport(
    settings: &ClientSettings,
    credentials: Arc<dyn CredentialSource>,
) -> Result<Arc<dyn EntryTransport>, ClientError> {
    let base_url = settings.base_url()?;

    let mut builder = Client::builder();
    if let Some(timeout) = settings.request_timeout() {
        builder = builder.timeout(timeout);
    }
    let http = builder
        .build()
        .map_err(|err| ClientError::Config(format!("failed to build HTTP client: {err}")))?;

    info!(
        mode = ?settings.mode,
        transport = ?settings.transport,
        base_url = %base_url,
        "configured entry client"
    );

    let transport: Arc<dyn EntryTransport> = match settings.transport {
        TransportKind::Http => Arc::new(
            ApiClient::with_client(http, base_url, credentials)
                .with_entries_path(settings.entries_path.clone()),
        ),
        TransportKind::Connect => {
            let mut client = ConnectEntryClient::with_client(http, base_url, credentials)
                .with_service(settings.connect_service.clone());
            if let Some(timeout) = settings.request_timeout() {
                client = client.with_timeout(timeout);
            }
            Arc::new(client)
        }
    };
    Ok(transport)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
