//! # jog-core
//!
//! Shared library for the jog transport-control channel: the wire codec, the
//! protocol message types, and the transport-state domain model.
//!
//! This crate is used by the engine binary and by driver-side tooling.
//! It has zero dependencies on sockets, pipes, or the async runtime.
//!
//! # Architecture overview
//!
//! jog is a remote control surface for a media playback engine: an external
//! driver process sends discrete transport commands (play, pause, seek, rate
//! change, quit) over an inter-process channel, and the engine answers with
//! periodic status snapshots (position, duration, frame rate, play rate, and
//! a one-shot media description).
//!
//! This crate (`jog-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes travel over the channel.  Messages are encoded
//!   into a compact binary payload, optionally framed with a 4-byte length
//!   prefix for byte-stream conduits, and decoded back into typed Rust values
//!   on the other end.
//!
//! - **`domain`** – Pure control logic with no I/O.  The most important piece
//!   is the [`Dispatcher`]: it turns an inbound [`Command`] into a
//!   [`TransportState`] transition plus an ordered list of [`Effect`]s for the
//!   caller to execute against the playback engine and the optional
//!   synchronization peer.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `jog_core::Dispatcher` instead of `jog_core::domain::transport::Dispatcher`.
pub use domain::media::{probe, MediaDescription, MediaSource, StreamDescription};
pub use domain::transport::{Dispatcher, Effect, PeerEvent, TransportState};
pub use protocol::codec::{
    decode_framed, decode_payload, encode_framed, encode_payload, DecodeError,
};
pub use protocol::messages::{ChannelMessage, Command, StatusSnapshot};
