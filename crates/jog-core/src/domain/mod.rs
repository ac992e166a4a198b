//! Domain module: pure transport-control logic with no I/O dependencies.

pub mod media;
pub mod transport;

pub use media::{probe, MediaDescription, MediaSource, StreamDescription};
pub use transport::{Dispatcher, Effect, PeerEvent, TransportState};
