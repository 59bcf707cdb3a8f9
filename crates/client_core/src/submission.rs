//! Submission lifecycle for the create-entry form.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use shared::{domain::EntryId, protocol::CreateEntryRequest};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::{error::ClientError, form::FieldStore, transport::EntryTransport};

const INTERRUPTED_MESSAGE: &str = "Submission was interrupted before the service responded";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded(EntryId),
    Failed(String),
}

impl SubmissionStatus {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionStatus::Submitting)
    }

    /// Banner text for the presentation layer, if the status warrants one.
    pub fn banner(&self) -> Option<String> {
        match self {
            SubmissionStatus::Idle => None,
            SubmissionStatus::Submitting => Some("Creating entry...".to_string()),
            SubmissionStatus::Succeeded(id) => {
                Some(format!("Entry created successfully! ID: {id}"))
            }
            SubmissionStatus::Failed(message) => {
                Some(format!("Failed to create entry: {message}"))
            }
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Idle => f.write_str("idle"),
            SubmissionStatus::Submitting => f.write_str("submitting"),
            SubmissionStatus::Succeeded(id) => write!(f, "succeeded ({id})"),
            SubmissionStatus::Failed(message) => write!(f, "failed ({message})"),
        }
    }
}

pub type EntryCreatedCallback = Arc<dyn Fn(&EntryId) + Send + Sync>;

/// Drives one form's submissions: validates the draft, dispatches through the
/// configured transport and publishes the resulting [`SubmissionStatus`].
///
/// At most one attempt is in flight at a time; a `submit` issued while another
/// is pending is rejected with [`ClientError::InFlight`] without dispatching.
pub struct SubmissionController {
    transport: Arc<dyn EntryTransport>,
    fields: Arc<FieldStore>,
    status: watch::Sender<SubmissionStatus>,
    in_flight: AtomicBool,
    on_entry_created: Option<EntryCreatedCallback>,
}

impl SubmissionController {
    pub fn new(transport: Arc<dyn EntryTransport>, fields: Arc<FieldStore>) -> Self {
        let (status, _) = watch::channel(SubmissionStatus::Idle);
        Self {
            transport,
            fields,
            status,
            in_flight: AtomicBool::new(false),
            on_entry_created: None,
        }
    }

    pub fn with_on_entry_created(
        mut self,
        callback: impl Fn(&EntryId) + Send + Sync + 'static,
    ) -> Self {
        self.on_entry_created = Some(Arc::new(callback));
        self
    }

    pub fn fields(&self) -> &Arc<FieldStore> {
        &self.fields
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    pub fn status_stream(&self) -> WatchStream<SubmissionStatus> {
        WatchStream::new(self.status.subscribe())
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(&self) -> Result<EntryId, ClientError> {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight, &self.status) else {
            warn!(transport = self.transport.name(), "ignoring submit while an entry submission is in flight");
            return Err(ClientError::InFlight);
        };

        let request = match self.fields.draft().to_request() {
            Ok(request) => request,
            Err(err) => {
                debug!(field = %err.field, "draft failed validation");
                return Err(err.into());
            }
        };

        self.status.send_replace(SubmissionStatus::Submitting);
        let started = Instant::now();
        let outcome = self.dispatch(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(entry_id) => {
                self.fields.reset();
                self.status
                    .send_replace(SubmissionStatus::Succeeded(entry_id.clone()));
                drop(guard);
                info!(transport = self.transport.name(), entry_id = %entry_id, elapsed_ms, "entry created");

                if let Some(callback) = &self.on_entry_created {
                    callback(&entry_id);
                }
                Ok(entry_id)
            }
            Err(err) => {
                self.status
                    .send_replace(SubmissionStatus::Failed(err.user_message()));
                drop(guard);
                warn!(transport = self.transport.name(), error = %err, elapsed_ms, "failed to create entry");
                Err(err)
            }
        }
    }

    async fn dispatch(&self, request: &CreateEntryRequest) -> Result<EntryId, ClientError> {
        let response = self.transport.create_entry(request).await?;
        response.entry_id().cloned().ok_or_else(|| {
            ClientError::MalformedResponse("response did not include the created entry's ID".into())
        })
    }
}

/// Holds the single in-flight slot. If the owning future is dropped mid-call
/// the slot is released and a lingering `Submitting` becomes `Failed`.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicBool,
    status: &'a watch::Sender<SubmissionStatus>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(
        in_flight: &'a AtomicBool,
        status: &'a watch::Sender<SubmissionStatus>,
    ) -> Option<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { in_flight, status })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.status.send_if_modified(|status| {
            if status.is_submitting() {
                *status = SubmissionStatus::Failed(INTERRUPTED_MESSAGE.to_string());
                true
            } else {
                false
            }
        });
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
