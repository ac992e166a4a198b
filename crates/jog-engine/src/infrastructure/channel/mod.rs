//! Channel transports: the inter-process conduits carrying commands in and
//! status out.
//!
//! Two interchangeable flavors exist, selected at start-up:
//!
//! - [`pipe`]: a byte-stream conduit, length-prefixed frames on stdin and
//!   status frames on a FIFO.
//! - [`socket`]: connectionless local sockets, one message per datagram,
//!   replying to the peer address learned from the most recent command.
//!
//! Both feed the session the same way: a reader task forwards
//! [`ChannelEvent`]s on an `mpsc` channel, and a [`StatusSink`] carries
//! snapshots back out.

pub mod pipe;
pub mod socket;

use async_trait::async_trait;
use jog_core::StatusSnapshot;
use tokio::sync::mpsc;
use tracing::info;

use crate::application::session::{ChannelError, ChannelEvent, StatusSink};
use crate::infrastructure::config::{ChannelFlavor, EngineConfig};

/// Status sink used when the status channel is disabled by configuration.
/// Publishing succeeds without doing anything.
pub struct NullStatusSink;

#[async_trait]
impl StatusSink for NullStatusSink {
    async fn publish(&mut self, _snapshot: &StatusSnapshot) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Establishes the configured channel flavor: spawns the command reader task
/// feeding `tx` and returns the status sink.
///
/// # Errors
///
/// Returns [`ChannelError::Setup`] when a required endpoint cannot be
/// established; the caller exits before the loop starts.
pub async fn establish(
    config: &EngineConfig,
    tx: mpsc::Sender<ChannelEvent>,
) -> Result<Box<dyn StatusSink>, ChannelError> {
    match config.flavor {
        ChannelFlavor::Pipe => {
            pipe::spawn_command_reader(tx);
            if config.status_enabled {
                let sink = pipe::FifoStatusSink::open(&config.status_pipe_path()).await?;
                Ok(Box::new(sink))
            } else {
                info!("status channel disabled by configuration");
                Ok(Box::new(NullStatusSink))
            }
        }
        ChannelFlavor::Socket => {
            let channel = socket::DatagramChannel::bind(&config.control_socket_path())?;
            channel.spawn_command_reader(tx);
            if config.status_enabled {
                let sink = channel.status_sink(&config.status_socket_path())?;
                Ok(Box::new(sink))
            } else {
                info!("status channel disabled by configuration");
                Ok(Box::new(NullStatusSink))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
