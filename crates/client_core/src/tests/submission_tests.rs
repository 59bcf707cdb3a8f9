use super::*;
use std::{
    collections::VecDeque,
    sync::atomic::AtomicUsize,
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{GrowthStage, UserId},
    error::ErrorCode,
    protocol::{CreateEntryResponse, Entry},
};
use tokio::sync::{oneshot, Mutex};

use crate::form::Draft;

enum Step {
    Respond(Result<CreateEntryResponse, ClientError>),
    YieldThen(Result<CreateEntryResponse, ClientError>),
    WaitFor(oneshot::Receiver<()>, Result<CreateEntryResponse, ClientError>),
    Hang,
}

struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Arc<Mutex<Vec<CreateEntryRequest>>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn dispatched(&self) -> Vec<CreateEntryRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl EntryTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn create_entry(
        &self,
        request: &CreateEntryRequest,
    ) -> Result<CreateEntryResponse, ClientError> {
        self.requests.lock().await.push(request.clone());
        let step = self
            .steps
            .lock()
            .await
            .pop_front()
            .expect("unexpected dispatch");

        match step {
            Step::Respond(outcome) => outcome,
            Step::YieldThen(outcome) => {
                tokio::task::yield_now().await;
                outcome
            }
            Step::WaitFor(gate, outcome) => {
                let _ = gate.await;
                outcome
            }
            Step::Hang => std::future::pending().await,
        }
    }
}

fn created(id: &str) -> Result<CreateEntryResponse, ClientError> {
    Ok(CreateEntryResponse {
        entry: Some(Entry {
            id: Some(EntryId::from(id)),
            title: "echo".into(),
            ..Entry::default()
        }),
    })
}

fn server_error() -> Result<CreateEntryResponse, ClientError> {
    Err(ClientError::http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
}

fn valid_fields() -> Arc<FieldStore> {
    let fields = Arc::new(FieldStore::new());
    fields.set_field("title", "  Garden log  ").expect("title");
    fields.set_field("content", " first spores ").expect("content");
    fields.set_field("growthStage", "1").expect("stage");
    fields
}

fn controller(transport: &Arc<ScriptedTransport>, fields: &Arc<FieldStore>) -> SubmissionController {
    SubmissionController::new(
        Arc::clone(transport) as Arc<dyn EntryTransport>,
        Arc::clone(fields),
    )
}

#[tokio::test]
async fn invalid_draft_never_reaches_transport() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new()));
    let fields = Arc::new(FieldStore::new());
    fields.set_field("title", "   ").expect("title");
    fields.set_field("content", "body").expect("content");
    let controller = controller(&transport, &fields);

    let err = controller.submit().await.expect_err("must fail");
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(controller.status(), SubmissionStatus::Idle);
    assert!(!controller.is_submitting());

    fields.set_field("title", "title").expect("title");
    fields.set_field("content", "\n").expect("content");
    let err = controller.submit().await.expect_err("must fail");
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(controller.status(), SubmissionStatus::Idle);
    assert!(transport.dispatched().await.is_empty());
}

#[tokio::test]
async fn dispatched_request_is_normalized() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Step::Respond(created("a")),
        Step::Respond(created("b")),
    ]));
    let fields = valid_fields();
    let controller = controller(&transport, &fields);

    fields.set_field("userId", "   ").expect("user id");
    controller.submit().await.expect("first submit");

    let fields = controller.fields();
    fields.set_field("title", "Second").expect("title");
    fields.set_field("content", "more").expect("content");
    fields.set_field("userId", " user-7 ").expect("user id");
    controller.submit().await.expect("second submit");

    let requests = transport.dispatched().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].title, "Garden log");
    assert_eq!(requests[0].content, "first spores");
    assert_eq!(requests[0].growth_stage, GrowthStage::Sprout);
    assert_eq!(requests[0].user_id, None);
    assert_eq!(requests[1].user_id, Some(UserId::from("user-7")));
    assert_eq!(requests[1].growth_stage, GrowthStage::Seed);
}

#[tokio::test]
async fn success_resets_draft_and_notifies_once() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(created("abc123"))]));
    let fields = valid_fields();
    let notified = Arc::new(std::sync::Mutex::new(Vec::new()));
    let draft_seen_by_callback = Arc::new(std::sync::Mutex::new(None));

    let controller = {
        let notified = Arc::clone(&notified);
        let draft_seen = Arc::clone(&draft_seen_by_callback);
        let fields_for_callback = Arc::clone(&fields);
        controller(&transport, &fields).with_on_entry_created(move |id| {
            notified.lock().expect("lock").push(id.clone());
            *draft_seen.lock().expect("lock") = Some(fields_for_callback.draft());
        })
    };

    let entry_id = controller.submit().await.expect("submit");

    assert_eq!(entry_id, EntryId::from("abc123"));
    assert_eq!(
        controller.status(),
        SubmissionStatus::Succeeded(EntryId::from("abc123"))
    );
    assert_eq!(fields.draft(), Draft::default());
    assert_eq!(*notified.lock().expect("lock"), vec![EntryId::from("abc123")]);
    assert_eq!(
        *draft_seen_by_callback.lock().expect("lock"),
        Some(Draft::default())
    );
}

#[tokio::test]
async fn success_without_identifier_is_a_failure() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(Ok(
        CreateEntryResponse {
            entry: Some(Entry::default()),
        },
    ))]));
    let fields = valid_fields();
    let before = fields.draft();
    let callbacks = Arc::new(AtomicUsize::new(0));
    let controller = {
        let callbacks = Arc::clone(&callbacks);
        controller(&transport, &fields).with_on_entry_created(move |_| {
            callbacks.fetch_add(1, Ordering::SeqCst);
        })
    };

    let err = controller.submit().await.expect_err("must fail");
    assert!(matches!(err, ClientError::MalformedResponse(_)));
    assert!(matches!(controller.status(), SubmissionStatus::Failed(_)));
    assert_eq!(fields.draft(), before);
    assert_eq!(callbacks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_call_keeps_draft_and_reports_readable_message() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(server_error())]));
    let fields = valid_fields();
    let before = fields.draft();
    let controller = controller(&transport, &fields);

    controller.submit().await.expect_err("must fail");

    match controller.status() {
        SubmissionStatus::Failed(message) => {
            assert_eq!(message, "HTTP 500 Internal Server Error");
        }
        other => panic!("unexpected status: {other}"),
    }
    assert_eq!(
        controller.status().banner().as_deref(),
        Some("Failed to create entry: HTTP 500 Internal Server Error")
    );
    assert_eq!(fields.draft(), before);
}

#[tokio::test]
async fn remote_error_message_reaches_status() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(Err(
        ClientError::Remote {
            code: ErrorCode::InvalidArgument,
            message: "invalid entry".into(),
        },
    ))]));
    let fields = valid_fields();
    let controller = controller(&transport, &fields);

    controller.submit().await.expect_err("must fail");
    assert_eq!(
        controller.status(),
        SubmissionStatus::Failed("invalid entry".into())
    );
}

#[tokio::test]
async fn submit_while_in_flight_is_rejected_without_dispatch() {
    let (release, gate) = oneshot::channel();
    let transport = Arc::new(ScriptedTransport::new(vec![Step::WaitFor(
        gate,
        created("only-one"),
    )]));
    let fields = valid_fields();
    let controller = Arc::new(controller(&transport, &fields));

    let mut status_rx = controller.subscribe();
    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit().await })
    };
    status_rx
        .wait_for(SubmissionStatus::is_submitting)
        .await
        .expect("submitting");

    let err = controller.submit().await.expect_err("second submit");
    assert!(matches!(err, ClientError::InFlight));
    assert_eq!(controller.status(), SubmissionStatus::Submitting);

    release.send(()).expect("release");
    let entry_id = first.await.expect("join").expect("first submit");
    assert_eq!(entry_id.as_str(), "only-one");
    assert_eq!(transport.dispatched().await.len(), 1);
}

#[tokio::test]
async fn double_trigger_in_same_task_dispatches_once() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::YieldThen(created("x1"))]));
    let fields = valid_fields();
    let controller = controller(&transport, &fields);

    let (first, second) = futures::future::join(controller.submit(), controller.submit()).await;

    assert_eq!(first.expect("first").as_str(), "x1");
    assert!(matches!(second, Err(ClientError::InFlight)));
    assert_eq!(transport.dispatched().await.len(), 1);
}

#[tokio::test]
async fn new_attempt_after_failure_can_succeed() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Step::Respond(server_error()),
        Step::Respond(created("retry-ok")),
    ]));
    let fields = valid_fields();
    let controller = controller(&transport, &fields);

    controller.submit().await.expect_err("first attempt");
    assert!(matches!(controller.status(), SubmissionStatus::Failed(_)));

    let entry_id = controller.submit().await.expect("second attempt");
    assert_eq!(
        controller.status(),
        SubmissionStatus::Succeeded(entry_id)
    );
    assert_eq!(transport.dispatched().await.len(), 2);
}

#[tokio::test]
async fn dropped_attempt_releases_the_in_flight_slot() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Step::Hang,
        Step::Respond(created("after-drop")),
    ]));
    let fields = valid_fields();
    let controller = controller(&transport, &fields);

    let timed_out = tokio::time::timeout(Duration::from_millis(20), controller.submit()).await;
    assert!(timed_out.is_err());
    assert!(!controller.is_submitting());
    assert_eq!(
        controller.status(),
        SubmissionStatus::Failed(INTERRUPTED_MESSAGE.to_string())
    );

    let entry_id = controller.submit().await.expect("fresh attempt");
    assert_eq!(entry_id.as_str(), "after-drop");
}

#[tokio::test]
async fn status_stream_starts_with_current_value() {
    use tokio_stream::StreamExt;

    let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(created("s1"))]));
    let fields = valid_fields();
    let controller = controller(&transport, &fields);

    let mut stream = controller.status_stream();
    assert_eq!(stream.next().await, Some(SubmissionStatus::Idle));

    controller.submit().await.expect("submit");
    assert_eq!(
        stream.next().await,
        Some(SubmissionStatus::Succeeded(EntryId::from("s1")))
    );
}

#[test]
fn banner_text_per_status() {
    assert_eq!(SubmissionStatus::Idle.banner(), None);
    assert_eq!(
        SubmissionStatus::Succeeded(EntryId::from("abc123")).banner().as_deref(),
        Some("Entry created successfully! ID: abc123")
    );
}
