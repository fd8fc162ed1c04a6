//! End-to-end tests for the `KeyInput` gRPC service.
//!
//! # Purpose
//!
//! These tests run the real tonic server on a loopback port and call it with
//! the generated client, exactly as a remote controller would.  The backend
//! collaborators are the recording fakes from
//! `relay_server::infrastructure::backend::mock`, so assertions can see what
//! reached the "hardware" or the "OS".
//!
//! ```text
//! KeyInputClient ──gRPC──▶ KeyInputService ──▶ RelayService ──▶ adapter ──▶ fake
//! ```

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use relay_core::{AbstractKey, BackendToken, KeyAction, KeyMappingTable, Preset};
use relay_server::application::adapters::{FocusGatedAdapter, KeyStroke, RawInjectionAdapter};
use relay_server::application::relay_keys::{BackendAdapter, RelayService};
use relay_server::infrastructure::backend::mock::{
    HardwareCall, RecordingHardwareEndpoint, RecordingSynthesizer, ScriptedWindow,
};
use relay_server::infrastructure::rpc::proto::key_input_client::KeyInputClient;
use relay_server::infrastructure::rpc::proto::{Key, KeyRequest};
use relay_server::infrastructure::rpc::{serve_with_listener, KeyInputService};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::transport::Channel;
use tonic::Code;

// ── Harness ───────────────────────────────────────────────────────────────────

struct Harness {
    client: KeyInputClient<Channel>,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
}

impl Harness {
    async fn start(table: KeyMappingTable, adapter: Arc<dyn BackendAdapter>) -> Self {
        let relay = RelayService::new(table, adapter).expect("table matches adapter");
        let service = KeyInputService::new(Arc::new(relay), 10);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr: SocketAddr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            serve_with_listener(service, listener, async {
                let _ = rx.await;
            })
            .await
            .expect("server");
        });

        let client = KeyInputClient::connect(format!("http://{addr}"))
            .await
            .expect("connect");
        Self {
            client,
            shutdown: Some(tx),
            server,
        }
    }

    async fn stop(self) {
        let Harness {
            client,
            shutdown,
            server,
        } = self;
        // Graceful shutdown waits for open connections.
        drop(client);
        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }
        server.await.expect("server task");
    }
}

fn req(key: Key) -> KeyRequest {
    KeyRequest { key: key as i32 }
}

fn arrows_table() -> KeyMappingTable {
    KeyMappingTable::new([
        (AbstractKey::Up, BackendToken::Keycode(82)),
        (AbstractKey::Down, BackendToken::Keycode(81)),
    ])
    .expect("non-empty")
}

async fn raw_harness() -> (Harness, Arc<RecordingHardwareEndpoint>) {
    let endpoint = Arc::new(RecordingHardwareEndpoint::new());
    let adapter = Arc::new(RawInjectionAdapter::new(Arc::clone(&endpoint) as _));
    (Harness::start(arrows_table(), adapter).await, endpoint)
}

async fn gated_harness(
    focused: bool,
) -> (Harness, Arc<ScriptedWindow>, Arc<RecordingSynthesizer>) {
    let window = Arc::new(ScriptedWindow::new(focused));
    let synth = Arc::new(RecordingSynthesizer::new());
    let adapter = Arc::new(FocusGatedAdapter::new(
        Arc::clone(&window) as _,
        Arc::clone(&synth) as _,
    ));
    let table = KeyMappingTable::from_preset(Preset::Synthetic);
    (Harness::start(table, adapter).await, window, synth)
}

// ── Raw injection ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_hold_and_release_up_reach_device_as_down_then_up() {
    // Arrange
    let (mut h, endpoint) = raw_harness().await;

    // Act
    h.client.send_down(req(Key::Up)).await.expect("SendDown");
    h.client.send_up(req(Key::Up)).await.expect("SendUp");

    // Assert
    assert_eq!(
        endpoint.calls(),
        vec![HardwareCall::Down(82), HardwareCall::Up(82)]
    );
    h.stop().await;
}

#[tokio::test]
async fn test_send_is_exactly_one_press_with_mapped_code() {
    let (mut h, endpoint) = raw_harness().await;

    h.client.send(req(Key::Down)).await.expect("Send");

    assert_eq!(
        endpoint.calls(),
        vec![HardwareCall::Press {
            code: 81,
            modifier: 0
        }]
    );
    h.stop().await;
}

#[tokio::test]
async fn test_unmapped_key_is_not_found() {
    let (mut h, endpoint) = raw_harness().await;

    let status = h.client.send(req(Key::Enter)).await.unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
    assert!(endpoint.calls().is_empty());
    h.stop().await;
}

#[tokio::test]
async fn test_out_of_range_wire_value_is_invalid_argument() {
    let (mut h, _endpoint) = raw_harness().await;

    let status = h.client.send(KeyRequest { key: 999 }).await.unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    h.stop().await;
}

#[tokio::test]
async fn test_device_failure_is_unavailable_and_server_keeps_serving() {
    // Arrange
    let (mut h, endpoint) = raw_harness().await;
    endpoint.should_fail.store(true, Ordering::SeqCst);

    // Act
    let status = h.client.send(req(Key::Up)).await.unwrap_err();
    endpoint.should_fail.store(false, Ordering::SeqCst);
    let retry = h.client.send(req(Key::Up)).await;

    // Assert
    assert_eq!(status.code(), Code::Unavailable);
    assert!(retry.is_ok());
    h.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests_all_reach_device() {
    let (h, endpoint) = raw_harness().await;

    let calls: Vec<_> = (0..16)
        .map(|i| {
            let mut client = h.client.clone();
            let key = if i % 2 == 0 { Key::Up } else { Key::Down };
            tokio::spawn(async move { client.send(req(key)).await })
        })
        .collect();
    for call in calls {
        call.await.expect("join").expect("Send");
    }

    assert_eq!(endpoint.calls().len(), 16);
    h.stop().await;
}

// ── Focus-gated synthesis ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unfocused_target_succeeds_without_synthesis() {
    // Arrange
    let (mut h, _window, synth) = gated_harness(false).await;

    // Act
    let result = h.client.send(req(Key::A)).await;

    // Assert
    assert!(result.is_ok());
    assert!(synth.strokes().is_empty());
    h.stop().await;
}

#[tokio::test]
async fn test_focused_target_gets_literal_char_and_named_key() {
    let (mut h, _window, synth) = gated_harness(true).await;

    h.client.send(req(Key::A)).await.expect("Send A");
    h.client.send(req(Key::Enter)).await.expect("Send Enter");
    h.client.send_down(req(Key::Shift)).await.expect("SendDown Shift");

    assert_eq!(
        synth.strokes(),
        vec![
            (KeyStroke::Char('a'), KeyAction::Press),
            (KeyStroke::Named("ENTER".to_string()), KeyAction::Press),
            (KeyStroke::Named("VK_SHIFT".to_string()), KeyAction::HoldDown),
        ]
    );
    h.stop().await;
}

#[tokio::test]
async fn test_focus_change_is_observed_per_request() {
    let (mut h, window, synth) = gated_harness(false).await;

    h.client.send(req(Key::B)).await.expect("unfocused");
    window.set_focused(true);
    h.client.send(req(Key::C)).await.expect("focused");

    assert_eq!(synth.strokes(), vec![(KeyStroke::Char('c'), KeyAction::Press)]);
    h.stop().await;
}

#[tokio::test]
async fn test_closed_window_is_unavailable() {
    let (mut h, window, synth) = gated_harness(true).await;
    window.close();

    let status = h.client.send(req(Key::A)).await.unwrap_err();

    assert_eq!(status.code(), Code::Unavailable);
    assert!(synth.strokes().is_empty());
    h.stop().await;
}
