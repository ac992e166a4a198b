//! The transport session: one cooperative poll loop driving the engine.
//!
//! The loop waits up to [`POLL_TIMEOUT`] for one inbound channel event.  A
//! decoded command is dispatched through the pure state machine and its
//! effects are executed against the [`PlaybackSink`] and the optional
//! [`SyncPeer`]; a malformed message is logged and skipped.  Every cycle ends
//! by publishing exactly one status snapshot, so the driver sees status at
//! least once per timeout period and immediately after every state change,
//! and a snapshot always reflects the fully-applied effect of every command
//! received before it was sent.
//!
//! Commands never overlap: transitions are synchronous and run to completion
//! inside the loop, so the transport state needs no locking.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jog_core::{
    Command, DecodeError, Dispatcher, Effect, MediaDescription, PeerEvent, StatusSnapshot,
    TransportState,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::status::build_snapshot;

/// Fixed poll timeout: the status cadence when no commands arrive.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors on the underlying transport.  All of these are fatal: the channel
/// has a single, non-redundant peer and there is no reconnection protocol.
///
/// Each failure site maps to a distinct process exit status via
/// [`ChannelError::exit_code`].
#[derive(Debug, Error)]
pub enum ChannelError {
    /// A required channel endpoint could not be established at startup.
    #[error("failed to establish {endpoint}: {source}")]
    Setup {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from the command conduit failed (end-of-input included).
    #[error("command channel read failed: {0}")]
    Read(#[source] std::io::Error),

    /// An inbound message exceeded the per-message size limit.
    #[error("inbound message of {declared} bytes exceeds the {max} byte limit")]
    Oversized { declared: usize, max: usize },

    /// Writing to the status conduit failed.
    #[error("status channel write failed: {0}")]
    Write(#[source] std::io::Error),
}

impl ChannelError {
    /// The process exit status for this failure site.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChannelError::Setup { .. } => 2,
            ChannelError::Read(_) => 3,
            ChannelError::Oversized { .. } => 4,
            ChannelError::Write(_) => 5,
        }
    }
}

/// Events delivered by the channel reader task to the session loop.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A complete command was received and decoded.
    Command(Command),
    /// An inbound message could not be decoded.  Recoverable: the session
    /// logs it and continues without touching the transport state.
    Malformed(DecodeError),
    /// A termination signal was delivered to the process.
    Shutdown,
    /// The transport failed; the session must terminate.
    Fatal(ChannelError),
}

/// Outbound half of the channel: encodes and sends one snapshot.
///
/// Implementations that are disabled by configuration publish as a silent
/// no-op.
#[async_trait]
pub trait StatusSink: Send {
    async fn publish(&mut self, snapshot: &StatusSnapshot) -> Result<(), ChannelError>;
}

/// Narrow seam to the playback framework hosting the session.
///
/// Mutating calls mirror the dispatcher's [`Effect`]s; the accessors are the
/// live measurements embedded in status snapshots, `None` when a measurement
/// is unavailable.
pub trait PlaybackSink: Send {
    /// Apply a new playback rate.
    fn set_rate(&mut self, rate: f64);
    /// Reposition to an absolute frame.
    fn seek(&mut self, position: i64);
    /// Discard frames pre-rendered ahead of the current position.
    fn flush(&mut self);
    /// Re-present the current frame even if nothing changed.
    fn request_refresh(&mut self);

    fn position(&self) -> Option<i64>;
    fn duration(&self) -> Option<i64>;
    fn frame_rate(&self) -> Option<f64>;
}

/// Optional external synchronization peer (a studio timecode or audio-clock
/// source).  Absence suppresses notifications and nothing else.
pub trait SyncPeer: Send {
    fn notify(&mut self, event: PeerEvent);
}

/// Owns everything one transport session needs: the inbound event stream,
/// the outbound status sink, the collaborators, and the transport state.
pub struct Session {
    events: mpsc::Receiver<ChannelEvent>,
    status: Box<dyn StatusSink>,
    playback: Box<dyn PlaybackSink>,
    peer: Option<Box<dyn SyncPeer>>,
    dispatcher: Dispatcher,
    state: TransportState,
    media: Arc<MediaDescription>,
}

impl Session {
    pub fn new(
        events: mpsc::Receiver<ChannelEvent>,
        status: Box<dyn StatusSink>,
        playback: Box<dyn PlaybackSink>,
        peer: Option<Box<dyn SyncPeer>>,
        time_scale: f64,
        media: Arc<MediaDescription>,
    ) -> Self {
        let dispatcher = Dispatcher::new(time_scale, peer.is_some());
        Self {
            events,
            status,
            playback,
            peer,
            dispatcher,
            state: TransportState::new(),
            media,
        }
    }

    /// Runs the poll loop until QUIT, a termination signal, or a fatal
    /// transport failure.
    ///
    /// # Errors
    ///
    /// Returns the [`ChannelError`] that ended the session; the caller maps
    /// it to an exit status.
    pub async fn run(&mut self) -> Result<(), ChannelError> {
        info!("transport session started");
        while !self.state.done {
            match timeout(POLL_TIMEOUT, self.events.recv()).await {
                // Timeout is the normal idle outcome, not an error.
                Err(_elapsed) => {}
                Ok(Some(ChannelEvent::Command(command))) => self.handle_command(&command),
                Ok(Some(ChannelEvent::Malformed(e))) => {
                    warn!("skipping malformed inbound message: {e}");
                }
                Ok(Some(ChannelEvent::Shutdown)) => {
                    info!("termination signal received, stopping transport");
                    self.state.done = true;
                    self.execute(vec![Effect::Notify(PeerEvent::Stop)]);
                }
                Ok(Some(ChannelEvent::Fatal(e))) => return Err(e),
                Ok(None) => {
                    return Err(ChannelError::Read(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "command channel closed",
                    )));
                }
            }
            self.publish().await?;
        }
        info!("transport session stopped");
        Ok(())
    }

    /// Dispatches one command and executes its effects.
    fn handle_command(&mut self, command: &Command) {
        debug!("dispatching {command:?}");
        // The sink is the measurement authority while frames are being
        // consumed; re-base the control record before dispatching so
        // relative seeks start from where playback actually is.
        if let Some(live) = self.playback.position() {
            self.state.position = live;
        }
        let effects = self.dispatcher.apply(&mut self.state, command);
        self.execute(effects);
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SetRate(rate) => self.playback.set_rate(rate),
                Effect::Flush => self.playback.flush(),
                Effect::Seek(position) => self.playback.seek(position),
                Effect::Notify(event) => {
                    if let Some(peer) = self.peer.as_mut() {
                        peer.notify(event);
                    }
                }
                Effect::Refresh => self.playback.request_refresh(),
            }
        }
    }

    async fn publish(&mut self) -> Result<(), ChannelError> {
        let snapshot = build_snapshot(&self.state, self.playback.as_ref(), &self.media);
        self.status.publish(&snapshot).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
