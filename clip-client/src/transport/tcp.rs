//! TcpTransport - point-to-point transport over a single TCP connection.
//!
//! One side listens and accepts exactly one peer, the other dials. Frames
//! are length-prefixed (4 bytes, big-endian) and capped at
//! [`MAX_MESSAGE_SIZE`].

use super::{Transport, TransportError, MAX_MESSAGE_SIZE};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Which end of the connection this transport is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TcpMode {
    /// Connect out to the peer's address.
    Dial,
    /// Bind the address and wait for the peer to connect.
    Listen,
}

/// Configuration for TcpTransport.
#[derive(Clone, Debug)]
pub struct TcpTransportConfig {
    /// Dial or listen.
    pub mode: TcpMode,
    /// Dial timeout. Listening waits for the peer indefinitely.
    pub connect_timeout: Duration,
    /// How long `recv()` waits before reporting, again, a connection the
    /// peer already closed.
    pub closed_backoff: Duration,
}

impl TcpTransportConfig {
    /// Dial with default timeouts.
    pub fn dial() -> Self {
        Self {
            mode: TcpMode::Dial,
            ..Self::default()
        }
    }

    /// Listen for one incoming peer.
    pub fn listen() -> Self {
        Self {
            mode: TcpMode::Listen,
            ..Self::default()
        }
    }
}

impl Default for TcpTransportConfig {
    fn default() -> Self {
        Self {
            mode: TcpMode::Dial,
            connect_timeout: Duration::from_secs(30),
            closed_backoff: Duration::from_secs(1),
        }
    }
}

/// TcpTransport implements the Transport trait over tokio TCP.
///
/// The read and write halves sit behind separate locks, so a `recv()`
/// parked waiting for the peer never holds up a `send()`.
///
/// # Example
///
/// ```ignore
/// let transport = TcpTransport::new(TcpTransportConfig::listen());
/// transport.connect("0.0.0.0:7777").await?;
/// transport.send(b"hello").await?;
/// let frame = transport.recv().await?;
/// ```
pub struct TcpTransport {
    config: TcpTransportConfig,
    /// Listener bound ahead of `connect()` via [`TcpTransport::bind`].
    listener: Mutex<Option<TcpListener>>,
    reader: Mutex<Option<OwnedReadHalf>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    connected: AtomicBool,
    /// Set once the read side is unusable (EOF or a framing error).
    hung_up: AtomicBool,
    peer_addr: std::sync::Mutex<Option<SocketAddr>>,
}

impl TcpTransport {
    /// Create an unconnected transport.
    pub fn new(config: TcpTransportConfig) -> Self {
        Self {
            config,
            listener: Mutex::new(None),
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            connected: AtomicBool::new(false),
            hung_up: AtomicBool::new(false),
            peer_addr: std::sync::Mutex::new(None),
        }
    }

    /// Bind the listening socket now and return the bound address.
    ///
    /// Useful with port 0. A later `connect()` accepts on this socket
    /// and ignores its address argument.
    pub async fn bind(&self, address: &str) -> Result<SocketAddr, TransportError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("Failed to bind {address}: {e}")))?;
        let local = listener
            .local_addr()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        *self.listener.lock().await = Some(listener);
        Ok(local)
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        *self.peer_addr.lock().unwrap()
    }

    async fn accept(&self, address: &str) -> Result<TcpStream, TransportError> {
        let mut guard = self.listener.lock().await;
        if guard.is_none() {
            let listener = TcpListener::bind(address).await.map_err(|e| {
                TransportError::ConnectionFailed(format!("Failed to bind {address}: {e}"))
            })?;
            *guard = Some(listener);
        }
        let listener = guard.as_ref().ok_or(TransportError::NotConnected)?;

        tracing::info!("Waiting for peer on {:?}", listener.local_addr().ok());
        let (stream, remote) = listener
            .accept()
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("Accept failed: {e}")))?;

        // Exactly one peer; stop listening
        guard.take();
        tracing::info!("Peer connected from {}", remote);
        Ok(stream)
    }

    async fn dial(&self, address: &str) -> Result<TcpStream, TransportError> {
        tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::ConnectionFailed(format!("Connection failed: {e}")))
    }
}

/// Read one length-prefixed frame.
async fn read_frame(reader: &mut OwnedReadHalf) -> Result<Vec<u8>, TransportError> {
    // Read length prefix (4 bytes, big-endian)
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TransportError::ConnectionClosed
        } else {
            TransportError::ReceiveFailed(format!("Failed to read length: {e}"))
        }
    })?;

    let len = u32::from_be_bytes(len_buf) as usize;

    // Validate length
    if len > MAX_MESSAGE_SIZE {
        return Err(TransportError::ReceiveFailed(format!(
            "Message too large: {} > {}",
            len, MAX_MESSAGE_SIZE
        )));
    }

    // Read payload
    let mut data = vec![0u8; len];
    reader
        .read_exact(&mut data)
        .await
        .map_err(|e| TransportError::ReceiveFailed(format!("Failed to read data: {e}")))?;

    Ok(data)
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        // Close existing connection if any
        self.close().await.ok();

        let stream = match self.config.mode {
            TcpMode::Dial => self.dial(address).await?,
            TcpMode::Listen => self.accept(address).await?,
        };
        stream.set_nodelay(true).ok();
        *self.peer_addr.lock().unwrap() = stream.peer_addr().ok();

        let (read, write) = stream.into_split();
        *self.reader.lock().await = Some(read);
        *self.writer.lock().await = Some(write);
        self.hung_up.store(false, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);

        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        // Validate message size
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(TransportError::SendFailed(format!(
                "Message too large: {} > {}",
                data.len(),
                MAX_MESSAGE_SIZE
            )));
        }

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(TransportError::NotConnected)?;

        // Length-prefixed framing (4 bytes, big-endian)
        let len = (data.len() as u32).to_be_bytes();
        writer
            .write_all(&len)
            .await
            .map_err(|e| TransportError::SendFailed(format!("Failed to write length: {e}")))?;

        // Write payload
        writer
            .write_all(data)
            .await
            .map_err(|e| TransportError::SendFailed(format!("Failed to write data: {e}")))?;

        Ok(())
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        let mut guard = self.reader.lock().await;
        let Some(reader) = guard.as_mut() else {
            if self.hung_up.load(Ordering::SeqCst) {
                // Nothing will ever arrive; don't let callers spin on it
                tokio::time::sleep(self.config.closed_backoff).await;
                return Err(TransportError::ConnectionClosed);
            }
            return Err(TransportError::NotConnected);
        };

        let result = read_frame(reader).await;
        match result {
            Ok(data) => Ok(data),
            Err(e) => {
                // The stream position is unknown after any read error
                guard.take();
                self.hung_up.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut writer) = self.writer.lock().await.take() {
            // Signal end of stream
            writer.shutdown().await.ok();
        }
        // A recv() parked on the reader keeps it until the peer hangs up
        if let Ok(mut reader) = self.reader.try_lock() {
            reader.take();
        }
        Ok(())
    }
}
