//! Transport-control protocol message types.
//!
//! Two schemas travel over the channel: [`Command`] (driver → engine) and
//! [`StatusSnapshot`] (engine → driver).  Every field that represents a
//! measurement is optional-presence: a snapshot simply omits a field when the
//! corresponding value is unavailable.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::media::MediaDescription;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the length prefix used by byte-stream framing, in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Upper bound on a single encoded message.  A datagram that fills this
/// buffer, or a declared frame length above it, is rejected.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Schema tag byte for a driver → engine [`Command`] payload.
pub const SCHEMA_COMMAND: u8 = 0x01;

/// Schema tag byte for an engine → driver [`StatusSnapshot`] payload.
pub const SCHEMA_STATUS: u8 = 0x02;

// ── Command type codes ────────────────────────────────────────────────────────

/// Wire tag bytes for each recognized command.
///
/// The exact values are an implementation choice of this protocol version;
/// the set and semantics are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandType {
    Pause = 0x00,
    Play = 0x01,
    PlayRate = 0x02,
    Seek = 0x03,
    SeekRelative = 0x04,
    Quit = 0x05,
}

impl TryFrom<u8> for CommandType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(CommandType::Pause),
            0x01 => Ok(CommandType::Play),
            0x02 => Ok(CommandType::PlayRate),
            0x03 => Ok(CommandType::Seek),
            0x04 => Ok(CommandType::SeekRelative),
            0x05 => Ok(CommandType::Quit),
            _ => Err(()),
        }
    }
}

// ── Commands (driver → engine) ────────────────────────────────────────────────

/// A transport command sent by the driver process.
///
/// Seek positions and deltas are expressed in source-native time units; the
/// dispatcher scales them by its fixed time-unit multiplier before they reach
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Stop playback.  When `resume_at` is present and the transport was
    /// playing, the engine seeks there as part of the pause; absence means
    /// "do not seek on pause".
    Pause { resume_at: Option<i64> },
    /// Start playback at the requested rate (1.0 = normal, negative = reverse).
    Play { rate: f64 },
    /// Change the playback rate without any other transport side effect.
    PlayRate { rate: f64 },
    /// Seek to an absolute target.
    Seek { position: i64 },
    /// Seek by a signed delta from the current position.
    SeekRelative { delta: i64 },
    /// Terminate the session.
    Quit,
    /// A command tag this protocol version does not recognize.  Decoded
    /// permissively and ignored by the dispatcher rather than treated as an
    /// error, so older engines tolerate newer drivers.
    Unknown { tag: u8 },
}

impl Command {
    /// Returns the wire tag byte for this command.
    pub fn tag(&self) -> u8 {
        match self {
            Command::Pause { .. } => CommandType::Pause as u8,
            Command::Play { .. } => CommandType::Play as u8,
            Command::PlayRate { .. } => CommandType::PlayRate as u8,
            Command::Seek { .. } => CommandType::Seek as u8,
            Command::SeekRelative { .. } => CommandType::SeekRelative as u8,
            Command::Quit => CommandType::Quit as u8,
            Command::Unknown { tag } => *tag,
        }
    }
}

// ── Status snapshots (engine → driver) ────────────────────────────────────────

/// One immutable, fully-formed status report pushed to the driver.
///
/// Published once per poll cycle (about 1 Hz when idle) and immediately after
/// every command-driven state change.  A snapshot always reflects the fully
/// applied effect of every command received before it was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Whether the transport considers itself playing.
    pub playing: Option<bool>,
    /// Current position in frames.
    pub position: Option<i64>,
    /// Total length of the media in frames.
    pub duration: Option<i64>,
    /// Frames per second of the session.
    pub frame_rate: Option<f64>,
    /// Current playback rate (0.0 = paused, negative = reverse).
    pub play_rate: Option<f64>,
    /// Description of the opened media source.  Built once at session start
    /// and shared by reference across every subsequent snapshot.
    pub media: Arc<MediaDescription>,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// Any message that can appear on the channel, discriminated by schema tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelMessage {
    Command(Command),
    Status(StatusSnapshot),
}

impl ChannelMessage {
    /// Returns the schema tag byte for this message.
    pub fn schema_tag(&self) -> u8 {
        match self {
            ChannelMessage::Command(_) => SCHEMA_COMMAND,
            ChannelMessage::Status(_) => SCHEMA_STATUS,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
