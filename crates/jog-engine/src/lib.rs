//! jog-engine library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does jog-engine do?
//!
//! The *engine* hosts a running playback session and obeys a remote driver
//! process.  The driver sends transport commands (play, pause, seek, rate
//! change, quit) over an inter-process channel; the engine applies them to
//! the session and pushes a status snapshot (position, duration, frame rate,
//! play rate, media description) back to the driver about once per second
//! and immediately after every state change.
//!
//! The engine application:
//!
//! 1. Probes the opened media source once and keeps the resulting
//!    description for every later snapshot.
//! 2. Establishes the control channel: framed messages on stdin plus a
//!    status FIFO, or a pair of local datagram sockets, both derived from
//!    the driver's process id.
//! 3. Polls the channel with a bounded timeout, dispatches each decoded
//!    command through the pure state machine in `jog-core`, and executes
//!    the resulting effects against the playback sink and the optional
//!    synchronization peer.
//!
//! Decoding, frame composition, and rendering are not this crate's concern:
//! the playback framework appears only behind the narrow `PlaybackSink`,
//! `SyncPeer`, and `MediaSource` seams.

/// Application layer: the session loop and status assembly.
pub mod application;

/// Infrastructure layer: channel transports, collaborator stand-ins, config.
pub mod infrastructure;
