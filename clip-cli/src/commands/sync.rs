//! Keep this machine's clipboard in step with the peer's.

use anyhow::{Context, Result};
use clip_client::{
    deliver, EngineConfig, PeerError, SecurePeer, SyncEngine, TcpTransport, TcpTransportConfig,
};
use clip_core::KeyMaterial;
use std::sync::Arc;

use crate::clipboard::{ClipboardWatcher, LastSeen, SystemClipboard};
use crate::config::{self, Network, Settings};

/// Run until Ctrl-C or until the engine stops delivering.
pub async fn run(settings: Settings) -> Result<()> {
    let key = config::load_key(&settings.key_file).await?;

    let peer = connect(&settings.network, &key)
        .await
        .context("Unable to connect to network")?;
    let peer = Arc::new(peer);
    tracing::info!("Connected as device {}", peer.device_id());

    let engine = SyncEngine::new(
        Arc::clone(&peer),
        EngineConfig::default().with_debug(settings.debug),
    );
    let (changes, notifications) = engine.notification_channel();
    let handles = engine.start(notifications);

    let last_seen = LastSeen::default();
    let mut sink = SystemClipboard::open(last_seen.clone()).context("Unable to open clipboard")?;
    let watcher = ClipboardWatcher::new(settings.poll_interval, last_seen);
    watcher
        .start(changes)
        .context("Failed to start clipboard watcher")?;

    tokio::select! {
        applied = deliver(handles.deliveries, &mut sink) => {
            tracing::info!("Delivery stopped after {} clipboard writes", applied);
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Interrupted, shutting down");
        }
    }

    watcher.stop();
    handles.outbound.abort();
    handles.inbound.abort();

    if let Err(e) = peer.close(Some("shutdown")).await {
        tracing::debug!("Failed to close peer: {}", e);
    }

    Ok(())
}

async fn connect(
    network: &Network,
    key: &KeyMaterial,
) -> Result<SecurePeer<TcpTransport>, PeerError> {
    let (config, address) = match network {
        Network::Connect(address) => (TcpTransportConfig::dial(), address),
        Network::Listen(address) => {
            eprintln!("Waiting for peer on {}", address);
            (TcpTransportConfig::listen(), address)
        }
    };

    let peer = SecurePeer::new(TcpTransport::new(config), key);
    peer.connect(address).await?;
    Ok(peer)
}
