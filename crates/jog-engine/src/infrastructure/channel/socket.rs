//! Datagram channel flavor: connectionless local sockets, one message per
//! datagram with no length prefix.
//!
//! The engine binds a control socket at a well-known path derived from the
//! driver's process id and learns the driver's address from the most recent
//! inbound datagram.  Status datagrams are addressed to the learned peer and
//! go out a second, independent socket, also bound at a pid-derived path so
//! the driver can tell the directions apart.  Until a first command arrives
//! there is no peer to reply to, and publishing is a silent no-op.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use jog_core::protocol::messages::MAX_MESSAGE_SIZE;
use jog_core::{decode_payload, encode_payload, ChannelMessage, DecodeError, StatusSnapshot};
use tokio::net::UnixDatagram;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::application::session::{ChannelError, ChannelEvent, StatusSink};

/// Last known address of the driver, shared between the command reader and
/// the status sink.
type PeerSlot = Arc<Mutex<Option<PathBuf>>>;

/// The engine's half of the datagram channel.
pub struct DatagramChannel {
    control: Arc<UnixDatagram>,
    peer: PeerSlot,
}

impl DatagramChannel {
    /// Binds the control socket.  A stale socket file from a previous run is
    /// removed first.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Setup`] when the socket cannot be bound.
    pub fn bind(path: &Path) -> Result<Self, ChannelError> {
        let _ = std::fs::remove_file(path);
        let control = UnixDatagram::bind(path).map_err(|source| ChannelError::Setup {
            endpoint: format!("control socket {}", path.display()),
            source,
        })?;
        info!("control socket bound: {}", path.display());
        Ok(Self {
            control: Arc::new(control),
            peer: Arc::new(Mutex::new(None)),
        })
    }

    /// Spawns the task that receives command datagrams and forwards them as
    /// [`ChannelEvent`]s on `tx`, capturing the sender's address for status
    /// replies.
    pub fn spawn_command_reader(&self, tx: mpsc::Sender<ChannelEvent>) {
        let socket = Arc::clone(&self.control);
        let peer = Arc::clone(&self.peer);
        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_MESSAGE_SIZE];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, addr)) => {
                        // A datagram that fills the buffer was likely cut off.
                        if len == buf.len() {
                            let _ = tx
                                .send(ChannelEvent::Fatal(ChannelError::Oversized {
                                    declared: len,
                                    max: MAX_MESSAGE_SIZE,
                                }))
                                .await;
                            return;
                        }
                        if let Some(path) = addr.as_pathname() {
                            let mut guard = peer.lock().await;
                            *guard = Some(path.to_path_buf());
                        }
                        let event = match decode_payload(&buf[..len]) {
                            Ok(ChannelMessage::Command(command)) => {
                                debug!("received {command:?}");
                                ChannelEvent::Command(command)
                            }
                            Ok(ChannelMessage::Status(_)) => {
                                ChannelEvent::Malformed(DecodeError::Malformed(
                                    "status schema on the command channel".to_string(),
                                ))
                            }
                            Err(e) => ChannelEvent::Malformed(e),
                        };
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(ChannelEvent::Fatal(ChannelError::Read(e))).await;
                        return;
                    }
                }
            }
        });
    }

    /// Binds the status socket and returns the outbound sink, sharing this
    /// channel's learned peer address.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Setup`] when the socket cannot be bound.
    pub fn status_sink(&self, path: &Path) -> Result<DatagramStatusSink, ChannelError> {
        let _ = std::fs::remove_file(path);
        let socket = UnixDatagram::bind(path).map_err(|source| ChannelError::Setup {
            endpoint: format!("status socket {}", path.display()),
            source,
        })?;
        info!("status socket bound: {}", path.display());
        Ok(DatagramStatusSink {
            socket,
            peer: Arc::clone(&self.peer),
        })
    }
}

/// Sends one bare status payload per datagram to the learned driver address.
pub struct DatagramStatusSink {
    socket: UnixDatagram,
    peer: PeerSlot,
}

#[async_trait]
impl StatusSink for DatagramStatusSink {
    async fn publish(&mut self, snapshot: &StatusSnapshot) -> Result<(), ChannelError> {
        let peer = { self.peer.lock().await.clone() };
        // No command has arrived yet: nowhere to reply.
        let Some(peer) = peer else {
            return Ok(());
        };
        let payload = encode_payload(&ChannelMessage::Status(snapshot.clone()));
        self.socket
            .send_to(&payload, &peer)
            .await
            .map_err(ChannelError::Write)?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
