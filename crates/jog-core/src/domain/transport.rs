//! Transport state machine and command dispatch.
//!
//! The [`Dispatcher`] is a pure state-transition function: it mutates a
//! [`TransportState`] and returns an ordered list of [`Effect`]s, but performs
//! no I/O itself.  The session loop executes the effects against the playback
//! engine and the optional synchronization peer, so the transition logic stays
//! trivially testable.

use crate::protocol::messages::Command;

/// The playback session's play/pause/seek/rate state, analogous to a tape
/// transport.
///
/// Owned exclusively by the engine process and mutated only through
/// [`Dispatcher::apply`], which is never invoked concurrently with itself, so
/// no locking is required.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportState {
    /// Whether the transport considers itself playing.
    pub playing: bool,
    /// Current position in frames.
    pub position: i64,
    /// Current playback rate (0.0 = paused, negative = reverse).
    pub play_rate: f64,
    /// Terminal flag: once set, the poll loop exits and no further command is
    /// applied.
    pub done: bool,
}

impl TransportState {
    /// Creates the session-start state.  Playback starts automatically, so
    /// the transport begins playing at normal rate.
    pub fn new() -> Self {
        Self {
            playing: true,
            position: 0,
            play_rate: 1.0,
            done: false,
        }
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}

/// An event for the optional external synchronization peer (a studio timecode
/// or audio-clock source kept aligned with the transport).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeerEvent {
    Start,
    Stop,
    Seek(i64),
}

/// A side effect the session must execute after a state transition.
///
/// Effects are emitted in execution order.  `Notify` effects are always
/// present in the list; the session suppresses them when no peer is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Apply the new playback rate to the engine.
    SetRate(f64),
    /// Discard frames the engine has pre-rendered ahead of the current
    /// position, forcing re-render from the new state.
    Flush,
    /// Reposition the engine to an absolute frame.
    Seek(i64),
    /// Notify the synchronization peer.
    Notify(PeerEvent),
    /// Ask the downstream renderer to re-present the current frame even if
    /// nothing else changed.
    Refresh,
}

/// Interprets decoded commands against the current transport state.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Fixed multiplier converting command time units to frames.
    time_scale: f64,
    /// Whether a synchronization peer is attached.  Affects only the PLAY
    /// rate rule; notifications are filtered by the caller.
    peer_attached: bool,
}

impl Dispatcher {
    pub fn new(time_scale: f64, peer_attached: bool) -> Self {
        Self {
            time_scale,
            peer_attached,
        }
    }

    /// Applies one command, mutating `state` and returning the side effects
    /// for the caller to execute, in order.
    ///
    /// Transitions are synchronous and run to completion; a snapshot built
    /// after this call reflects the command in full.
    pub fn apply(&self, state: &mut TransportState, command: &Command) -> Vec<Effect> {
        let mut effects = Vec::new();
        match command {
            Command::Pause { resume_at } => {
                if state.play_rate != 0.0 {
                    state.play_rate = 0.0;
                    effects.push(Effect::SetRate(0.0));
                    effects.push(Effect::Flush);
                    // A resume position is honored only when the transport was
                    // actually in the playing state.
                    if state.playing {
                        if let Some(position) = resume_at {
                            let target = self.scale_absolute(*position);
                            state.position = target;
                            effects.push(Effect::Seek(target));
                        }
                    }
                }
                effects.push(Effect::Notify(PeerEvent::Stop));
                state.playing = false;
            }
            Command::Play { rate } => {
                // With a peer attached and the transport paused, the peer's
                // own start event drives the rate change instead.
                if !self.peer_attached || state.play_rate != 0.0 {
                    state.play_rate = *rate;
                    effects.push(Effect::SetRate(*rate));
                }
                effects.push(Effect::Flush);
                effects.push(Effect::Notify(PeerEvent::Start));
                state.playing = true;
            }
            Command::PlayRate { rate } => {
                state.play_rate = *rate;
                effects.push(Effect::SetRate(*rate));
            }
            Command::Seek { position } => {
                let target = self.scale_absolute(*position);
                effects.push(Effect::Flush);
                state.position = target;
                effects.push(Effect::Seek(target));
                effects.push(Effect::Notify(PeerEvent::Seek(target)));
            }
            Command::SeekRelative { delta } => {
                let target = state.position + self.scale_relative(*delta);
                effects.push(Effect::Flush);
                state.position = target;
                effects.push(Effect::Seek(target));
                effects.push(Effect::Notify(PeerEvent::Seek(target)));
            }
            Command::Quit => {
                state.done = true;
                effects.push(Effect::Notify(PeerEvent::Stop));
            }
            // Unrecognized commands are ignored, not rejected.
            Command::Unknown { .. } => {}
        }
        effects.push(Effect::Refresh);
        effects
    }

    /// Scales an absolute seek target, rounding half away from zero.
    fn scale_absolute(&self, position: i64) -> i64 {
        (self.time_scale * position as f64).round() as i64
    }

    /// Scales a relative seek delta.  Negative deltas floor and positive
    /// deltas ceil, so a relative seek never under-shoots in magnitude.
    fn scale_relative(&self, delta: i64) -> i64 {
        let scaled = self.time_scale * delta as f64;
        if delta < 0 {
            scaled.floor() as i64
        } else {
            scaled.ceil() as i64
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
