//! Application layer: the transport session loop and status assembly.

pub mod session;
pub mod status;

pub use session::{
    ChannelError, ChannelEvent, PlaybackSink, Session, StatusSink, SyncPeer, POLL_TIMEOUT,
};
pub use status::build_snapshot;
