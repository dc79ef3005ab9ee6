//! SyncEngine - two-way clipboard propagation.
//!
//! # Architecture
//!
//! ```text
//! clipboard watcher ─► [notifications] ─► outbound task ─► Peer ─► network
//!                                                                    │
//! clipboard sink ◄─ deliver() ◄─ [deliveries] ◄─ inbound task ◄─ Peer ◄┘
//! ```
//!
//! Each task owns its own [`EchoState`]; they share nothing but the peer
//! handle, which supports one concurrent send and one concurrent receive.
//! Both channels hold a single value by default, so a fast producer waits
//! for its consumer instead of buffering.
//!
//! # Example
//!
//! ```ignore
//! let engine = SyncEngine::new(Arc::new(peer), EngineConfig::default());
//! let (notify_tx, notify_rx) = engine.notification_channel();
//! let handles = engine.start(notify_rx);
//! // feed notify_tx from the clipboard watcher, then on the main task:
//! deliver(handles.deliveries, &mut clipboard).await;
//! ```

use clip_core::{EchoState, SyncEvent};
use clip_types::ClipboardValue;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clipboard::ClipboardSink;
use crate::debug::DebugLog;
use crate::peer::Peer;

/// Configuration for the engine, fixed before it starts.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Emit one line per send/receive attempt.
    pub debug: bool,
    /// Capacity of the notification and delivery channels.
    pub queue_capacity: usize,
}

impl EngineConfig {
    /// Turn debug lines on or off.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            queue_capacity: 1,
        }
    }
}

/// Forward local clipboard changes to the peer.
///
/// A value equal to the last one handled is dropped without touching the
/// peer. Anything else is sent once and becomes the new last value whether
/// or not the send succeeded, so a failing peer never sees the same value
/// retried on every poll. Returns when `notifications` closes.
pub async fn run_outbound<P>(
    peer: &P,
    mut notifications: mpsc::Receiver<ClipboardValue>,
    log: DebugLog,
) -> EchoState
where
    P: Peer + ?Sized,
{
    let mut echo = EchoState::new();

    while let Some(value) = notifications.recv().await {
        if !echo.admit(&value) {
            tracing::trace!("Suppressed repeat of last sent value");
            continue;
        }

        match peer.send(&value).await {
            Ok(()) => log.record(&SyncEvent::Sent(value)),
            Err(e) => log.record(&SyncEvent::SendFailed(e.to_string())),
        }
    }

    tracing::debug!("Notification channel closed, outbound task exiting");
    echo
}

/// Forward peer values toward the local clipboard.
///
/// Receive errors are recorded and the next receive starts right away;
/// the remembered value only changes on a successful receive. Returns when
/// the delivery receiver is dropped.
pub async fn run_inbound<P>(
    peer: &P,
    deliveries: mpsc::Sender<ClipboardValue>,
    log: DebugLog,
) -> EchoState
where
    P: Peer + ?Sized,
{
    let mut echo = EchoState::new();

    loop {
        let received = tokio::select! {
            _ = deliveries.closed() => break,
            received = peer.recv() => received,
        };

        match received {
            Ok(received) => {
                log.record(&SyncEvent::Received(received.value.clone()));
                if !echo.admit(&received.value) {
                    continue;
                }
                if deliveries.send(received.value).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                log.record(&SyncEvent::ReceiveFailed(e.to_string()));
                // A dead peer errors on every call; let other tasks run
                tokio::task::yield_now().await;
            }
        }
    }

    tracing::debug!("Delivery channel closed, inbound task exiting");
    echo
}

/// Apply delivered values to the clipboard.
///
/// Meant for the primary task, the one allowed to touch the clipboard.
/// No deduplication happens here. A failed write is logged and skipped.
/// Returns the number of successful writes once `deliveries` closes.
pub async fn deliver<S>(mut deliveries: mpsc::Receiver<ClipboardValue>, sink: &mut S) -> usize
where
    S: ClipboardSink + ?Sized,
{
    let mut applied = 0;

    while let Some(value) = deliveries.recv().await {
        match sink.set(&value) {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!("Failed to set clipboard: {}", e),
        }
    }

    applied
}

/// Handles to a running engine.
#[derive(Debug)]
pub struct EngineHandles {
    /// Values to apply to the local clipboard; pass to [`deliver`].
    pub deliveries: mpsc::Receiver<ClipboardValue>,
    /// The outbound task. Yields its final state when notifications close.
    pub outbound: JoinHandle<EchoState>,
    /// The inbound task. Yields its final state when deliveries close.
    pub inbound: JoinHandle<EchoState>,
}

impl EngineHandles {
    /// Stop both tasks without draining.
    pub fn abort(&self) {
        self.outbound.abort();
        self.inbound.abort();
    }
}

/// Owns the peer and spawns the two propagation tasks.
pub struct SyncEngine<P: Peer + 'static> {
    peer: Arc<P>,
    config: EngineConfig,
}

impl<P: Peer + 'static> SyncEngine<P> {
    /// Create an engine around a connected peer.
    pub fn new(peer: Arc<P>, config: EngineConfig) -> Self {
        Self { peer, config }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A channel sized for feeding clipboard changes into [`SyncEngine::start`].
    pub fn notification_channel(
        &self,
    ) -> (mpsc::Sender<ClipboardValue>, mpsc::Receiver<ClipboardValue>) {
        mpsc::channel(self.config.queue_capacity.max(1))
    }

    /// Spawn the outbound and inbound tasks.
    ///
    /// Consumes the engine: one pair of tasks per engine.
    pub fn start(self, notifications: mpsc::Receiver<ClipboardValue>) -> EngineHandles {
        let (deliveries_tx, deliveries_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let log = DebugLog::new(self.config.debug);

        let outbound = {
            let peer = Arc::clone(&self.peer);
            tokio::spawn(async move { run_outbound(&*peer, notifications, log).await })
        };
        let inbound = {
            let peer = Arc::clone(&self.peer);
            tokio::spawn(async move { run_inbound(&*peer, deliveries_tx, log).await })
        };

        tracing::debug!(
            "Sync engine started (debug={}, queue_capacity={})",
            self.config.debug,
            self.config.queue_capacity
        );

        EngineHandles {
            deliveries: deliveries_rx,
            outbound,
            inbound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MockClipboard;
    use crate::debug::tests::Capture;
    use crate::peer::SecurePeer;
    use crate::transport::MockTransport;
    use clip_core::KeyMaterial;
    use std::time::Duration;

    type TestPeer = SecurePeer<MockTransport>;

    fn v(s: &str) -> ClipboardValue {
        ClipboardValue::from(s)
    }

    /// A local peer and the remote end it is linked to.
    async fn linked_peers() -> (Arc<TestPeer>, Arc<TestPeer>) {
        let key = KeyMaterial::from_bytes([42u8; 32]);
        let (ta, tb) = MockTransport::pair();
        let local = SecurePeer::new(ta, &key);
        let remote = SecurePeer::new(tb, &key);
        local.connect("remote").await.unwrap();
        remote.connect("local").await.unwrap();
        (Arc::new(local), Arc::new(remote))
    }

    async fn outbound_with(peer: &TestPeer, values: &[&str]) -> EchoState {
        let (tx, rx) = mpsc::channel(1);
        let feed = {
            let values: Vec<ClipboardValue> = values.iter().map(|s| v(s)).collect();
            tokio::spawn(async move {
                for value in values {
                    tx.send(value).await.unwrap();
                }
            })
        };
        let state = run_outbound(peer, rx, DebugLog::default()).await;
        feed.await.unwrap();
        state
    }

    async fn next_delivery(rx: &mut mpsc::Receiver<ClipboardValue>) -> ClipboardValue {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no delivery within 2s")
            .expect("delivery channel closed")
    }

    async fn eventually(what: &str, check: impl Fn() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {what}");
    }

    // ===========================================
    // Outbound Task Tests
    // ===========================================

    #[tokio::test]
    async fn new_clipboard_value_is_sent() {
        let (local, remote) = linked_peers().await;

        let state = outbound_with(&local, &["hello"]).await;

        assert_eq!(state.last(), Some(&v("hello")));
        assert_eq!(local.transport().sent_messages().len(), 1);
        assert_eq!(remote.recv().await.unwrap().value, v("hello"));
    }

    #[tokio::test]
    async fn repeated_clipboard_value_is_sent_once() {
        let (local, remote) = linked_peers().await;

        let state = outbound_with(&local, &["hello", "hello"]).await;

        assert_eq!(state.last(), Some(&v("hello")));
        assert_eq!(local.transport().sent_messages().len(), 1);
        assert_eq!(remote.recv().await.unwrap().value, v("hello"));
    }

    #[tokio::test]
    async fn dedup_is_consecutive_only() {
        let (local, remote) = linked_peers().await;

        outbound_with(&local, &["A", "B", "A"]).await;

        assert_eq!(local.transport().sent_messages().len(), 3);
        for expected in ["A", "B", "A"] {
            assert_eq!(remote.recv().await.unwrap().value, v(expected));
        }
    }

    #[tokio::test]
    async fn failed_send_is_not_retried_and_loop_continues() {
        let (local, remote) = linked_peers().await;
        local.transport().fail_next_send("link down");

        let state = outbound_with(&local, &["lost", "lost", "next"]).await;

        // "lost" was attempted once, then suppressed; "next" still went out
        assert_eq!(state.last(), Some(&v("next")));
        assert_eq!(local.transport().sent_messages().len(), 1);
        assert_eq!(remote.recv().await.unwrap().value, v("next"));
    }

    #[tokio::test]
    async fn outbound_exits_when_notifications_close() {
        let (local, _remote) = linked_peers().await;
        let (tx, rx) = mpsc::channel::<ClipboardValue>(1);
        drop(tx);

        let state = run_outbound(&*local, rx, DebugLog::default()).await;
        assert!(state.last().is_none());
    }

    // ===========================================
    // Inbound Task Tests
    // ===========================================

    #[tokio::test]
    async fn repeated_peer_value_is_delivered_once() {
        let (local, remote) = linked_peers().await;
        let (tx, mut rx) = mpsc::channel(1);
        let task = {
            let local = Arc::clone(&local);
            tokio::spawn(async move { run_inbound(&*local, tx, DebugLog::default()).await })
        };

        for value in ["world", "world", "next"] {
            remote.send(&v(value)).await.unwrap();
        }

        assert_eq!(next_delivery(&mut rx).await, v("world"));
        assert_eq!(next_delivery(&mut rx).await, v("next"));

        drop(rx);
        let state = task.await.unwrap();
        assert_eq!(state.last(), Some(&v("next")));
    }

    #[tokio::test]
    async fn receive_error_does_not_stop_the_loop() {
        let (local, remote) = linked_peers().await;
        let (tx, mut rx) = mpsc::channel(1);
        let task = {
            let local = Arc::clone(&local);
            tokio::spawn(async move { run_inbound(&*local, tx, DebugLog::default()).await })
        };

        local.transport().queue_recv_error("transport glitch");
        remote.send(&v("after")).await.unwrap();

        assert_eq!(next_delivery(&mut rx).await, v("after"));
        assert!(local.transport().recv_attempts() >= 2);

        drop(rx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn receive_error_leaves_state_untouched() {
        let (local, remote) = linked_peers().await;
        let (tx, mut rx) = mpsc::channel(1);
        let task = {
            let local = Arc::clone(&local);
            tokio::spawn(async move { run_inbound(&*local, tx, DebugLog::default()).await })
        };

        remote.send(&v("x")).await.unwrap();
        assert_eq!(next_delivery(&mut rx).await, v("x"));

        local.transport().queue_recv_error("glitch");
        remote.send(&v("x")).await.unwrap();
        remote.send(&v("y")).await.unwrap();

        // The second "x" is still suppressed after the error
        assert_eq!(next_delivery(&mut rx).await, v("y"));

        drop(rx);
        let state = task.await.unwrap();
        assert_eq!(state.last(), Some(&v("y")));
    }

    #[tokio::test]
    async fn undecryptable_frame_is_a_receive_error() {
        let (local, remote) = linked_peers().await;
        let (tx, mut rx) = mpsc::channel(1);
        let task = {
            let local = Arc::clone(&local);
            tokio::spawn(async move { run_inbound(&*local, tx, DebugLog::default()).await })
        };

        local.transport().queue_response(b"not an envelope".to_vec());
        remote.send(&v("valid")).await.unwrap();

        assert_eq!(next_delivery(&mut rx).await, v("valid"));

        drop(rx);
        task.await.unwrap();
    }

    // ===========================================
    // Delivery Tests
    // ===========================================

    #[tokio::test]
    async fn deliver_writes_every_value() {
        let (tx, rx) = mpsc::channel(1);
        let mut clipboard = MockClipboard::new();

        let feed = tokio::spawn(async move {
            for value in ["a", "a", "b"] {
                tx.send(v(value)).await.unwrap();
            }
        });

        let applied = deliver(rx, &mut clipboard).await;
        feed.await.unwrap();

        assert_eq!(applied, 3);
        assert_eq!(clipboard.writes(), vec![v("a"), v("a"), v("b")]);
    }

    #[tokio::test]
    async fn deliver_survives_sink_failure() {
        let (tx, rx) = mpsc::channel(1);
        let mut clipboard = MockClipboard::new();
        clipboard.fail_next_set("clipboard busy");

        let feed = tokio::spawn(async move {
            tx.send(v("dropped")).await.unwrap();
            tx.send(v("kept")).await.unwrap();
        });

        let applied = deliver(rx, &mut clipboard).await;
        feed.await.unwrap();

        assert_eq!(applied, 1);
        assert_eq!(clipboard.current(), Some(v("kept")));
    }

    // ===========================================
    // Engine Tests
    // ===========================================

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert!(!config.debug);
        assert_eq!(config.queue_capacity, 1);
        assert!(config.with_debug(true).debug);
    }

    #[tokio::test]
    async fn directions_do_not_suppress_each_other() {
        let (local, remote) = linked_peers().await;
        let engine = SyncEngine::new(Arc::clone(&local), EngineConfig::default());
        let (notify_tx, notify_rx) = engine.notification_channel();
        let mut handles = engine.start(notify_rx);

        // Sending X does not stop X from being received...
        notify_tx.send(v("X")).await.unwrap();
        assert_eq!(remote.recv().await.unwrap().value, v("X"));
        remote.send(&v("X")).await.unwrap();
        assert_eq!(next_delivery(&mut handles.deliveries).await, v("X"));

        // ...and receiving Y does not stop Y from being sent
        remote.send(&v("Y")).await.unwrap();
        assert_eq!(next_delivery(&mut handles.deliveries).await, v("Y"));
        notify_tx.send(v("Y")).await.unwrap();
        assert_eq!(remote.recv().await.unwrap().value, v("Y"));

        drop(notify_tx);
        let outbound = handles.outbound.await.unwrap();
        assert_eq!(outbound.last(), Some(&v("Y")));
        handles.inbound.abort();
    }

    #[tokio::test]
    async fn clipboard_echo_dies_out_between_two_engines() {
        let key = KeyMaterial::from_bytes([1u8; 32]);
        let (ta, tb) = MockTransport::pair();
        let peer_a = Arc::new(SecurePeer::new(ta, &key));
        let peer_b = Arc::new(SecurePeer::new(tb, &key));
        peer_a.connect("b").await.unwrap();
        peer_b.connect("a").await.unwrap();

        // Each side: engine + clipboard that reports its own writes as changes
        let mut nodes = Vec::new();
        for peer in [&peer_a, &peer_b] {
            let engine = SyncEngine::new(Arc::clone(peer), EngineConfig::default());
            let (notify_tx, notify_rx) = engine.notification_channel();
            let handles = engine.start(notify_rx);

            let (echo_tx, mut echo_rx) = mpsc::unbounded_channel();
            let clipboard = MockClipboard::new();
            clipboard.echo_writes_to(echo_tx);

            let forward_tx = notify_tx.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(value) = echo_rx.recv().await {
                    if forward_tx.send(value).await.is_err() {
                        break;
                    }
                }
            });
            let mut sink = clipboard.clone();
            let deliveries = handles.deliveries;
            let delivery = tokio::spawn(async move { deliver(deliveries, &mut sink).await });

            nodes.push((notify_tx, clipboard, forwarder, delivery, handles.outbound, handles.inbound));
        }

        // User copies "world" on A
        nodes[0].0.send(v("world")).await.unwrap();

        let (clip_a, clip_b) = (nodes[0].1.clone(), nodes[1].1.clone());
        eventually("B to apply the value", || clip_b.current() == Some(v("world"))).await;
        eventually("the bounce to reach A", || clip_a.writes().len() == 1).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        // A sent once; B bounced it back once; A's outbound stopped the loop
        assert_eq!(peer_a.transport().sent_messages().len(), 1);
        assert_eq!(peer_b.transport().sent_messages().len(), 1);
        assert_eq!(clip_a.writes(), vec![v("world")]);
        assert_eq!(clip_b.writes(), vec![v("world")]);

        for (_, _, forwarder, delivery, outbound, inbound) in nodes {
            forwarder.abort();
            delivery.abort();
            outbound.abort();
            inbound.abort();
        }
    }

    // ===========================================
    // Debug Instrumentation Tests
    // ===========================================

    #[tokio::test]
    async fn debug_engine_logs_each_attempt() {
        let capture = Capture::default();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let (local, remote) = linked_peers().await;
        local.transport().queue_recv_error("boom");

        let engine = SyncEngine::new(Arc::clone(&local), EngineConfig::default().with_debug(true));
        let (notify_tx, notify_rx) = engine.notification_channel();
        let mut handles = engine.start(notify_rx);

        notify_tx.send(v("hello")).await.unwrap();
        notify_tx.send(v("hello")).await.unwrap();
        assert_eq!(remote.recv().await.unwrap().value, v("hello"));

        remote.send(&v("world")).await.unwrap();
        assert_eq!(next_delivery(&mut handles.deliveries).await, v("world"));

        drop(notify_tx);
        handles.outbound.await.unwrap();
        handles.inbound.abort();

        let text = capture.text();
        assert_eq!(text.matches("SEND: hello").count(), 1, "got: {text}");
        assert!(text.contains("RECV: ERROR: transport error: receive failed: boom"), "got: {text}");
        assert!(text.contains("RECV: world"), "got: {text}");
    }

    #[tokio::test]
    async fn quiet_engine_logs_nothing_at_debug_target() {
        let capture = Capture::default();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        let (local, remote) = linked_peers().await;
        let engine = SyncEngine::new(Arc::clone(&local), EngineConfig::default());
        let (notify_tx, notify_rx) = engine.notification_channel();
        let handles = engine.start(notify_rx);

        notify_tx.send(v("hello")).await.unwrap();
        assert_eq!(remote.recv().await.unwrap().value, v("hello"));

        drop(notify_tx);
        handles.outbound.await.unwrap();
        handles.inbound.abort();

        assert!(!capture.text().contains(crate::debug::DEBUG_TARGET));
    }
}
