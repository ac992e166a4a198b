//! jog engine entry point.
//!
//! Wires together the control channel, the playback sink, the optional
//! synchronization peer, and the session loop, then runs until QUIT, a
//! termination signal, or a fatal transport failure.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ probe()                -- one-shot media description
//!  └─ channel::establish()   -- pipe or datagram flavor, per --channel
//!  └─ Session::run()         -- poll loop
//!       ├─ Command            -> Dispatcher -> effects -> PlaybackSink/SyncPeer
//!       ├─ Malformed          -> warn + skip
//!       └─ every cycle        -> StatusSink::publish(snapshot)
//! ```
//!
//! # Channel endpoints
//!
//! Endpoint names derive from the parent (driver) process id:
//!
//! | flavor | commands in            | status out                  |
//! |--------|------------------------|-----------------------------|
//! | pipe   | stdin                  | `<dir>/jog-status-<pid>`    |
//! | socket | `<dir>/jog-ctl-<pid>.sock` | `<dir>/jog-status-<pid>.sock` |
//!
//! # Exit statuses
//!
//! Fatal conditions terminate with a distinct status per failure site:
//! 2 = endpoint setup, 3 = command read failure, 4 = oversized message,
//! 5 = status write failure.
//!
//! # Playback stand-ins
//!
//! The `SimulatedPlayback` sink and `StaticMediaSource` used here model the
//! playback framework; a production build replaces them with the adapters
//! around the real engine.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jog_core::probe;
use jog_engine::application::session::{ChannelEvent, PlaybackSink, Session, SyncPeer};
use jog_engine::infrastructure::channel;
use jog_engine::infrastructure::config::{ChannelFlavor, EngineConfig};
use jog_engine::infrastructure::peer::LoggingSyncPeer;
use jog_engine::infrastructure::playback::SimulatedPlayback;
use jog_engine::infrastructure::probe::StaticMediaSource;

/// Demo session length in frames (one hour at 25 fps).
const SIMULATED_DURATION: i64 = 90_000;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChannelArg {
    /// Length-prefixed frames on stdin, status frames on a FIFO.
    Pipe,
    /// One message per datagram on a pair of local sockets.
    Socket,
}

/// Remote transport control session for a media playback engine.
///
/// A driver process sends play/pause/seek/rate/quit commands over the
/// selected channel; the engine applies them and pushes status snapshots
/// back about once per second.
#[derive(Debug, Parser)]
#[command(
    name = "jog-engine",
    about = "Remote transport control session for a media playback engine",
    version
)]
struct Cli {
    /// Control channel flavor.
    #[arg(long, value_enum, default_value_t = ChannelArg::Pipe, env = "JOG_CHANNEL")]
    channel: ChannelArg,

    /// Directory where the per-driver channel endpoints live.
    #[arg(long, default_value = "/tmp", env = "JOG_RUNTIME_DIR")]
    runtime_dir: PathBuf,

    /// Disable the status channel entirely (inbound commands are unaffected).
    #[arg(long, env = "JOG_DISABLE_STATUS")]
    disable_status: bool,

    /// Multiplier converting command time units to engine frames.
    #[arg(long, default_value_t = 1.0, env = "JOG_TIME_SCALE")]
    time_scale: f64,

    /// Attach the synchronization peer.
    #[arg(long, env = "JOG_SYNC_PEER")]
    sync_peer: bool,
}

impl Cli {
    fn into_config(self) -> EngineConfig {
        EngineConfig {
            flavor: match self.channel {
                ChannelArg::Pipe => ChannelFlavor::Pipe,
                ChannelArg::Socket => ChannelFlavor::Socket,
            },
            runtime_dir: self.runtime_dir,
            status_enabled: !self.disable_status,
            time_scale: self.time_scale,
            peer_enabled: self.sync_peer,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();
    info!("jog engine starting (driver pid {})", config.driver_pid);

    // One-shot media description, shared by every snapshot.
    let media = Arc::new(probe(&StaticMediaSource::stereo_1080p()));

    // ── Control channel ───────────────────────────────────────────────────────
    let (tx, rx) = mpsc::channel::<ChannelEvent>(128);
    let status = match channel::establish(&config, tx.clone()).await {
        Ok(sink) => sink,
        Err(e) => {
            error!("cannot establish control channel: {e}");
            std::process::exit(e.exit_code());
        }
    };

    // ── Termination signals ───────────────────────────────────────────────────
    let shutdown_tx = tx.clone();
    tokio::spawn(async move {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(term) => term,
            Err(e) => {
                error!("cannot install SIGTERM handler: {e}");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
        let _ = shutdown_tx.send(ChannelEvent::Shutdown).await;
    });

    // ── Collaborators ─────────────────────────────────────────────────────────
    // Production builds swap these for the playback-framework adapters.
    let frame_rate = media.frame_rate.unwrap_or(25.0);
    let playback: Box<dyn PlaybackSink> =
        Box::new(SimulatedPlayback::new(SIMULATED_DURATION, frame_rate));
    let peer: Option<Box<dyn SyncPeer>> = config
        .peer_enabled
        .then(|| Box::new(LoggingSyncPeer) as Box<dyn SyncPeer>);

    // ── Session loop ──────────────────────────────────────────────────────────
    let mut session = Session::new(rx, status, playback, peer, config.time_scale, media);
    if let Err(e) = session.run().await {
        error!("fatal transport failure: {e}");
        std::process::exit(e.exit_code());
    }

    info!("jog engine stopped");
    Ok(())
}
