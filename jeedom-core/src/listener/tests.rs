use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use jeedom_sdk::objects::{ApiKey, EventBatch};
use serde_json::{json, Value};
use url::Url;

use super::*;
use crate::connectivity::NetworkStatus;
use crate::sink::{MemoryStore, AUTH_FAILURE_MESSAGE, COMMUNICATION_ERROR_MESSAGE};

const READ_DELAY: Duration = Duration::from_secs(5);

/// Transport answering from a script; an exhausted script fails the call.
#[derive(Default)]
struct ScriptedTransport {
    api_key: Mutex<Option<ApiKey>>,
    responses: Mutex<VecDeque<Result<EventBatch, RpcError>>>,
    requests: Mutex<Vec<f64>>,
}

impl ScriptedTransport {
    fn with_key() -> Self {
        let transport = Self::default();
        *transport.api_key.lock().unwrap() = Some(ApiKey::new("secret"));
        transport
    }

    fn push_batch(&self, datetime: f64, result: Value) {
        let batch = serde_json::from_value(json!({"datetime": datetime, "result": result})).unwrap();
        self.responses.lock().unwrap().push_back(Ok(batch));
    }

    fn push_error(&self) {
        self.responses.lock().unwrap().push_back(Err(RpcError::Remote {
            code: -32000,
            message: "boom".into(),
            data: None,
        }));
    }

    fn requests(&self) -> Vec<f64> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    fn api_key(&self) -> Option<ApiKey> {
        self.api_key.lock().unwrap().clone()
    }

    async fn fetch_events(&self, since: Cursor) -> Result<EventBatch, RpcError> {
        self.requests.lock().unwrap().push(since.as_secs());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Unexpected("script exhausted".into())))
    }
}

struct Fixture {
    listener: EventListener,
    transport: Arc<ScriptedTransport>,
    network: NetworkStatus,
    store: Arc<MemoryStore>,
}

fn fixture(config: ListenerConfig, transport: ScriptedTransport) -> Fixture {
    let transport = Arc::new(transport);
    let network = NetworkStatus::new(true);
    let store = Arc::new(MemoryStore::new());
    let listener = EventListener::new(
        config,
        transport.clone(),
        Arc::new(network.clone()),
        store.clone(),
    )
    .with_cursor(Cursor::from_secs(50.0));
    Fixture {
        listener,
        transport,
        network,
        store,
    }
}

fn polling_config() -> ListenerConfig {
    ListenerConfig::default().with_read_delay(READ_DELAY)
}

fn socket_config() -> ListenerConfig {
    // Nothing is ever listening on the discard port.
    polling_config().with_websocket_url(Url::parse("ws://127.0.0.1:9/ws").unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_offline_start_is_noop() {
    for config in [polling_config(), socket_config()] {
        let f = fixture(config, ScriptedTransport::with_key());
        f.network.set_online(false);

        for (reset, refresh) in [(false, false), (true, false), (false, true), (true, true)] {
            f.listener.start(reset, refresh);
        }
        tokio::time::sleep(READ_DELAY * 3).await;

        assert!(f.transport.requests().is_empty());
        assert_eq!(f.listener.mode(), DeliveryMode::Idle);
        assert_eq!(f.listener.channel_state(), ChannelState::Closed);
        assert!(f.store.status_reports().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_credential_reports_auth_failure() {
    let f = fixture(socket_config(), ScriptedTransport::default());
    f.store.set_authenticated(true);

    f.listener.start(true, true);

    assert_eq!(f.listener.channel_state(), ChannelState::Closed);
    assert_eq!(f.listener.mode(), DeliveryMode::Idle);
    assert!(!f.store.is_authenticated());
    assert_eq!(f.store.notifications()[0].message, AUTH_FAILURE_MESSAGE);
    assert!(f.transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_successful_poll_reschedules_once_failed_poll_stops() {
    let f = fixture(polling_config(), ScriptedTransport::with_key());
    f.transport.push_batch(
        100.0,
        json!([{"name": "cmd::update", "option": {"cmd_id": "1", "value": 21}}]),
    );

    f.listener.start(true, false);
    tokio::time::sleep(READ_DELAY / 2).await;

    assert_eq!(f.transport.requests(), vec![50.0]);
    assert_eq!(f.listener.mode(), DeliveryMode::Polling);
    assert_eq!(f.store.command_value("1"), Some(json!(21)));

    // Second poll: the script is exhausted, the chain stops.
    tokio::time::sleep(READ_DELAY).await;
    assert_eq!(f.transport.requests(), vec![50.0, 100.0]);
    assert_eq!(f.listener.mode(), DeliveryMode::Idle);
    assert_eq!(f.listener.cursor(), Cursor::from_secs(100.0));

    tokio::time::sleep(READ_DELAY * 4).await;
    assert_eq!(f.transport.requests().len(), 2);
    assert_eq!(f.store.status_reports(), vec![true, true, false]);
    assert_eq!(
        f.store.notifications().last().map(|n| n.message.as_str()),
        Some(COMMUNICATION_ERROR_MESSAGE)
    );
}

#[tokio::test(start_paused = true)]
async fn test_cursor_round_trips_between_polls() {
    let f = fixture(polling_config(), ScriptedTransport::with_key());
    for datetime in [60.0, 60.0, 75.5] {
        f.transport.push_batch(datetime, json!([]));
    }

    f.listener.start(true, false);
    tokio::time::sleep(READ_DELAY * 3 + READ_DELAY / 2).await;

    // Three scripted batches, then the failing fourth call.
    assert_eq!(f.transport.requests(), vec![50.0, 60.0, 60.0, 75.5]);
    assert_eq!(f.listener.cursor(), Cursor::from_secs(75.5));
}

#[tokio::test]
async fn test_failed_poll_keeps_cursor() {
    let f = fixture(polling_config(), ScriptedTransport::with_key());
    f.transport.push_error();

    let err = f.listener.poll_once().await.unwrap_err();

    assert!(matches!(err, ListenerError::Poll(RpcError::Remote { code: -32000, .. })));
    assert_eq!(f.listener.cursor(), Cursor::from_secs(50.0));
    assert_eq!(f.store.status_reports(), vec![true, false]);
    assert_eq!(f.store.notifications().len(), 1);
}

#[tokio::test]
async fn test_empty_batch_moves_cursor_only() {
    let f = fixture(polling_config(), ScriptedTransport::with_key());
    f.transport.push_batch(77.0, json!([]));

    assert_eq!(f.listener.poll_once().await.unwrap(), 0);

    assert_eq!(f.listener.cursor(), Cursor::from_secs(77.0));
    assert_eq!(f.store.command_batches(), 0);
    assert_eq!(f.store.summary_updates(), 0);
    assert!(f.store.notifications().is_empty());
}

#[tokio::test]
async fn test_duplicate_command_applied_once() {
    let f = fixture(polling_config(), ScriptedTransport::with_key());
    f.transport.push_batch(
        80.0,
        json!([
            {"name": "cmd::update", "option": {"cmd_id": "4", "value": "first"}},
            {"name": "cmd::update", "option": {"cmd_id": "4", "value": "second"}},
        ]),
    );

    assert_eq!(f.listener.poll_once().await.unwrap(), 1);

    assert_eq!(f.store.command_batches(), 1);
    assert_eq!(f.store.command_value("4"), Some(json!("second")));
}

/// Transport answering like `event::changes`: every event newer than the
/// requested cursor, stamped with the server clock.
struct ChangesTransport {
    events: Vec<(f64, Value)>,
    now: f64,
    requests: Mutex<Vec<f64>>,
}

#[async_trait]
impl RpcTransport for ChangesTransport {
    fn api_key(&self) -> Option<ApiKey> {
        Some(ApiKey::new("secret"))
    }

    async fn fetch_events(&self, since: Cursor) -> Result<EventBatch, RpcError> {
        self.requests.lock().unwrap().push(since.as_secs());
        let result: Vec<Value> = self
            .events
            .iter()
            .filter(|(at, _)| *at > since.as_secs())
            .map(|(_, event)| event.clone())
            .collect();
        Ok(serde_json::from_value(json!({"datetime": self.now, "result": result})).unwrap())
    }
}

#[tokio::test(start_paused = true)]
async fn test_malformed_event_does_not_stall_polling() {
    let transport = Arc::new(ChangesTransport {
        events: vec![
            (55.0, json!({"name": "cmd::update", "option": {"value": 1}})),
            (58.0, json!({"name": "cmd::update", "option": {"cmd_id": "9", "value": 7}})),
        ],
        now: 60.0,
        requests: Mutex::new(Vec::new()),
    });
    let store = Arc::new(MemoryStore::new());
    let listener = EventListener::new(
        polling_config(),
        transport.clone(),
        Arc::new(NetworkStatus::new(true)),
        store.clone(),
    )
    .with_cursor(Cursor::from_secs(50.0));

    listener.start(true, false);
    tokio::time::sleep(READ_DELAY * 3 + READ_DELAY / 2).await;

    assert_eq!(*transport.requests.lock().unwrap(), vec![50.0, 60.0, 60.0, 60.0]);
    assert_eq!(listener.cursor(), Cursor::from_secs(60.0));
    assert_eq!(store.command_value("9"), Some(json!(7)));
    assert_eq!(store.command_batches(), 1);
    assert_eq!(listener.mode(), DeliveryMode::Polling);
    listener.close();
}

#[tokio::test(start_paused = true)]
async fn test_restart_keeps_a_single_timer() {
    let f = fixture(polling_config(), ScriptedTransport::with_key());
    for datetime in [51.0, 52.0, 53.0, 54.0] {
        f.transport.push_batch(datetime, json!([]));
    }

    f.listener.start(true, false);
    tokio::time::sleep(READ_DELAY / 2).await;
    f.listener.start(true, false);
    tokio::time::sleep(READ_DELAY / 4).await;
    assert_eq!(f.transport.requests().len(), 2);

    // Only the second run is still scheduled.
    tokio::time::sleep(READ_DELAY).await;
    assert_eq!(f.transport.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_polling() {
    let f = fixture(polling_config(), ScriptedTransport::with_key());
    for datetime in [51.0, 52.0] {
        f.transport.push_batch(datetime, json!([]));
    }

    f.listener.start(true, false);
    tokio::time::sleep(READ_DELAY / 2).await;
    f.listener.close();
    tokio::time::sleep(READ_DELAY * 3).await;

    assert_eq!(f.transport.requests().len(), 1);
    assert_eq!(f.listener.mode(), DeliveryMode::Idle);
    assert_eq!(f.store.status_reports(), vec![true, false]);
}

#[tokio::test]
async fn test_close_with_nothing_active() {
    let f = fixture(socket_config(), ScriptedTransport::with_key());

    f.listener.close();
    f.listener.close();

    assert_eq!(f.store.status_reports(), vec![false, false]);
    assert_eq!(f.listener.mode(), DeliveryMode::Idle);
    assert_eq!(f.listener.channel_state(), ChannelState::Closed);
}

#[tokio::test]
async fn test_start_while_opening_is_single_flight() {
    let f = fixture(socket_config(), ScriptedTransport::with_key());

    f.listener.start(true, false);
    let before = (f.listener.channel_state(), f.listener.retries(), f.listener.cursor());
    f.listener.start(true, true);
    f.listener.start(false, false);

    assert_eq!(before.0, ChannelState::Opening);
    assert_eq!(
        (f.listener.channel_state(), f.listener.retries(), f.listener.cursor()),
        before
    );
    assert!(f.transport.requests().is_empty());
    f.listener.close();
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending_refresh() {
    let f = fixture(socket_config(), ScriptedTransport::with_key());
    f.transport.push_batch(90.0, json!([]));

    f.listener.start(true, true);
    f.listener.close();
    tokio::time::sleep(READ_DELAY).await;

    assert!(f.transport.requests().is_empty());
    assert_eq!(f.store.status_reports(), vec![false]);
    assert_eq!(f.listener.cursor(), Cursor::from_secs(50.0));
}
