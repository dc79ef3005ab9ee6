//! Mock transport for testing.
//!
//! Allows scripting inbound frames and failures and capturing sent frames
//! for verification. Two mocks can be linked with [`MockTransport::pair`]
//! so that each one's sends arrive at the other's `recv()`.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// What the next `recv()` yields.
#[derive(Debug)]
enum Delivery {
    Frame(Vec<u8>),
    Error(String),
    Closed,
}

/// Mock transport for testing.
///
/// `recv()` suspends until something is queued, like a real connection
/// waiting on the network.
#[derive(Debug)]
pub struct MockTransport {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<MockTransportInner>,
    inbox_tx: mpsc::UnboundedSender<Delivery>,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<Delivery>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_address: Option<String>,
    sent_messages: Vec<Vec<u8>>,
    recv_attempts: usize,
    fail_next_connect: Option<String>,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
    /// Inbox of the linked mock, if any.
    link: Option<mpsc::UnboundedSender<Delivery>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(MockTransportInner::default()),
                inbox_tx,
                inbox: tokio::sync::Mutex::new(inbox_rx),
            }),
        }
    }

    /// Create two linked transports. Frames sent on one are received on
    /// the other; closing one makes the other's `recv()` report
    /// `ConnectionClosed`.
    pub fn pair() -> (Self, Self) {
        let a = Self::new();
        let b = Self::new();
        a.lock().link = Some(b.inner.inbox_tx.clone());
        b.lock().link = Some(a.inner.inbox_tx.clone());
        (a, b)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockTransportInner> {
        self.inner.state.lock().unwrap()
    }

    /// Queue a frame to be returned by a later `recv()` call.
    pub fn queue_response(&self, data: Vec<u8>) {
        let _ = self.inner.inbox_tx.send(Delivery::Frame(data));
    }

    /// Queue a receive failure, ordered with queued frames.
    pub fn queue_recv_error(&self, error: &str) {
        let _ = self.inner.inbox_tx.send(Delivery::Error(error.to_string()));
    }

    /// Queue a remote close, ordered with queued frames.
    pub fn queue_close(&self) {
        let _ = self.inner.inbox_tx.send(Delivery::Closed);
    }

    /// Get all messages that were sent.
    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.lock().sent_messages.clone()
    }

    /// Get the last message that was sent.
    pub fn last_sent(&self) -> Option<Vec<u8>> {
        self.lock().sent_messages.last().cloned()
    }

    /// Number of `recv()` calls that have started.
    pub fn recv_attempts(&self) -> usize {
        self.lock().recv_attempts
    }

    /// Get the address that was connected to.
    pub fn connected_address(&self) -> Option<String> {
        self.lock().connected_address.clone()
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        self.lock().fail_next_connect = Some(error.to_string());
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        self.lock().fail_next_send = Some(error.to_string());
    }

    /// Cause the next recv() to fail with the given error, ahead of
    /// anything already queued.
    pub fn fail_next_recv(&self, error: &str) {
        self.lock().fail_next_recv = Some(error.to_string());
    }

    /// Clear all state (messages, queue, connection). Links are kept.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            let link = inner.link.take();
            *inner = MockTransportInner {
                link,
                ..MockTransportInner::default()
            };
        }
        if let Ok(mut inbox) = self.inner.inbox.try_lock() {
            while inbox.try_recv().is_ok() {}
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        let mut inner = self.lock();

        // Check for forced failure
        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.connected_address = Some(address.to_string());
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(data.to_vec());
        if let Some(link) = &inner.link {
            link.send(Delivery::Frame(data.to_vec()))
                .map_err(|_| TransportError::ConnectionClosed)?;
        }
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        {
            let mut inner = self.lock();

            if !inner.connected {
                return Err(TransportError::NotConnected);
            }

            inner.recv_attempts += 1;

            // Check for forced failure
            if let Some(error) = inner.fail_next_recv.take() {
                return Err(TransportError::ReceiveFailed(error));
            }
        }

        let mut inbox = self.inner.inbox.lock().await;
        match inbox.recv().await {
            Some(Delivery::Frame(data)) => Ok(data),
            Some(Delivery::Error(error)) => Err(TransportError::ReceiveFailed(error)),
            Some(Delivery::Closed) | None => Err(TransportError::ConnectionClosed),
        }
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.connected = false;
        if let Some(link) = &inner.link {
            let _ = link.send(Delivery::Closed);
        }
        Ok(())
    }
}
