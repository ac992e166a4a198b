//! Status snapshot assembly.
//!
//! A snapshot combines the transport state the dispatcher owns with the live
//! measurements the playback sink exposes.  The media description is attached
//! by reference: it was probed once at session start and is never recomputed.

use std::sync::Arc;

use jog_core::{MediaDescription, StatusSnapshot, TransportState};

use crate::application::session::PlaybackSink;

/// Builds one snapshot of the current session.
///
/// `playing` and `play_rate` come from the transport state; `position`,
/// `duration`, and `frame_rate` are live measurements and may be absent.
/// The frame rate falls back to the probed media description when the sink
/// cannot measure it.
pub fn build_snapshot(
    state: &TransportState,
    playback: &dyn PlaybackSink,
    media: &Arc<MediaDescription>,
) -> StatusSnapshot {
    StatusSnapshot {
        playing: Some(state.playing),
        play_rate: Some(state.play_rate),
        position: playback.position().or(Some(state.position)),
        duration: playback.duration(),
        frame_rate: playback.frame_rate().or(media.frame_rate),
        media: Arc::clone(media),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
