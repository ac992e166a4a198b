//! Synchronization peer stand-in.
//!
//! The real collaborator is an external clock/transport (a studio timecode
//! or audio-clock source) that must hear start/stop/seek to stay aligned.
//! Until that adapter lands, this implementation records the notifications
//! in the log.

use jog_core::PeerEvent;
use tracing::info;

use crate::application::session::SyncPeer;

/// Logs every notification the transport would send to the peer.
pub struct LoggingSyncPeer;

impl SyncPeer for LoggingSyncPeer {
    fn notify(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Start => info!("sync peer: start"),
            PeerEvent::Stop => info!("sync peer: stop"),
            PeerEvent::Seek(position) => info!(position, "sync peer: seek"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_peer_accepts_every_event() {
        let mut peer = LoggingSyncPeer;
        peer.notify(PeerEvent::Start);
        peer.notify(PeerEvent::Seek(100));
        peer.notify(PeerEvent::Stop);
    }
}
