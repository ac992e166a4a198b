//! Integration tests for the transport session loop.
//!
//! These drive a full `Session` over mock collaborators: a scripted event
//! stream stands in for the channel reader task, and recording stand-ins
//! capture what reaches the playback engine, the synchronization peer, and
//! the status channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jog_core::{Command, DecodeError, MediaDescription, PeerEvent, StatusSnapshot, StreamDescription};
use jog_engine::application::session::{
    ChannelError, ChannelEvent, PlaybackSink, Session, StatusSink, SyncPeer,
};
use tokio::sync::mpsc;

// ── Recording collaborators ───────────────────────────────────────────────────

#[derive(Default)]
struct PlaybackLog {
    rates: Vec<f64>,
    seeks: Vec<i64>,
    flushes: usize,
    refreshes: usize,
    position: i64,
}

#[derive(Clone, Default)]
struct RecordingPlayback(Arc<Mutex<PlaybackLog>>);

impl PlaybackSink for RecordingPlayback {
    fn set_rate(&mut self, rate: f64) {
        self.0.lock().unwrap().rates.push(rate);
    }
    fn seek(&mut self, position: i64) {
        let mut log = self.0.lock().unwrap();
        log.seeks.push(position);
        log.position = position;
    }
    fn flush(&mut self) {
        self.0.lock().unwrap().flushes += 1;
    }
    fn request_refresh(&mut self) {
        self.0.lock().unwrap().refreshes += 1;
    }
    fn position(&self) -> Option<i64> {
        Some(self.0.lock().unwrap().position)
    }
    fn duration(&self) -> Option<i64> {
        Some(1000)
    }
    fn frame_rate(&self) -> Option<f64> {
        None
    }
}

#[derive(Clone, Default)]
struct RecordingPeer(Arc<Mutex<Vec<PeerEvent>>>);

impl SyncPeer for RecordingPeer {
    fn notify(&mut self, event: PeerEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[derive(Clone, Default)]
struct CollectingSink(Arc<Mutex<Vec<StatusSnapshot>>>);

#[async_trait]
impl StatusSink for CollectingSink {
    async fn publish(&mut self, snapshot: &StatusSnapshot) -> Result<(), ChannelError> {
        self.0.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

fn probed_media() -> Arc<MediaDescription> {
    Arc::new(MediaDescription {
        streams: vec![
            StreamDescription::Audio {
                channels: 2,
                language: Some("eng".to_string()),
            },
            StreamDescription::Video {
                frame_rate: 30.0,
                width: 1920,
                height: 1080,
            },
        ],
        total_audio_channels: Some(2),
        frame_rate: Some(30.0),
    })
}

struct Harness {
    tx: mpsc::Sender<ChannelEvent>,
    playback: RecordingPlayback,
    peer: RecordingPeer,
    sink: CollectingSink,
    session: Session,
}

fn harness_with_peer(attach_peer: bool) -> Harness {
    let (tx, rx) = mpsc::channel(32);
    let playback = RecordingPlayback::default();
    let peer = RecordingPeer::default();
    let sink = CollectingSink::default();
    let session = Session::new(
        rx,
        Box::new(sink.clone()),
        Box::new(playback.clone()),
        attach_peer.then(|| Box::new(peer.clone()) as Box<dyn SyncPeer>),
        1.0,
        probed_media(),
    );
    Harness {
        tx,
        playback,
        peer,
        sink,
        session,
    }
}

async fn send_commands(tx: &mpsc::Sender<ChannelEvent>, commands: Vec<Command>) {
    for command in commands {
        tx.send(ChannelEvent::Command(command)).await.unwrap();
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_play_seek_pause_scenario_over_the_full_loop() {
    let mut h = harness_with_peer(true);
    send_commands(
        &h.tx,
        vec![
            Command::Pause { resume_at: None }, // start from a paused transport
            Command::Play { rate: 1.0 },
            Command::Seek { position: 100 },
            Command::Pause { resume_at: None },
            Command::Quit,
        ],
    )
    .await;

    h.session.run().await.expect("clean shutdown");

    // Peer heard stop, start, seek(100), stop, stop, in that order.
    assert_eq!(
        *h.peer.0.lock().unwrap(),
        vec![
            PeerEvent::Stop,
            PeerEvent::Start,
            PeerEvent::Seek(100),
            PeerEvent::Stop,
            PeerEvent::Stop,
        ]
    );

    // The engine was repositioned exactly once.
    assert_eq!(h.playback.0.lock().unwrap().seeks, vec![100]);

    let snapshots = h.sink.0.lock().unwrap();
    assert_eq!(snapshots.len(), 5, "one snapshot per command cycle");

    // After PLAY: playing with the requested rate.
    assert_eq!(snapshots[1].playing, Some(true));

    // After SEEK: position landed at 100.
    assert_eq!(snapshots[2].position, Some(100));

    // After PAUSE with no target: stopped, position untouched.
    assert_eq!(snapshots[3].playing, Some(false));
    assert_eq!(snapshots[3].play_rate, Some(0.0));
    assert_eq!(snapshots[3].position, Some(100));
}

#[tokio::test]
async fn test_snapshots_reuse_the_probed_media_description() {
    let mut h = harness_with_peer(false);
    send_commands(&h.tx, vec![Command::Play { rate: 1.0 }, Command::Quit]).await;

    h.session.run().await.expect("clean shutdown");

    let snapshots = h.sink.0.lock().unwrap();
    assert!(snapshots.len() >= 2);
    assert!(
        Arc::ptr_eq(&snapshots[0].media, &snapshots[1].media),
        "the media description is attached by reference, never recomputed"
    );
    assert_eq!(snapshots[0].media.stream_count(), 2);
    assert_eq!(snapshots[0].media.total_audio_channels, Some(2));
    assert_eq!(snapshots[0].frame_rate, Some(30.0));
}

#[tokio::test]
async fn test_no_command_is_applied_after_quit() {
    let mut h = harness_with_peer(false);
    send_commands(
        &h.tx,
        vec![
            Command::Quit,
            Command::Play { rate: 9.0 },
            Command::Seek { position: 5 },
        ],
    )
    .await;

    h.session.run().await.expect("clean shutdown");

    let log = h.playback.0.lock().unwrap();
    assert!(log.rates.is_empty());
    assert!(log.seeks.is_empty());
    assert_eq!(
        h.sink.0.lock().unwrap().len(),
        1,
        "only the quit cycle published"
    );
}

#[tokio::test]
async fn test_truncated_message_does_not_mutate_transport_state() {
    let mut h = harness_with_peer(false);
    h.tx.send(ChannelEvent::Malformed(DecodeError::Truncated {
        needed: 64,
        available: 7,
    }))
    .await
    .unwrap();
    send_commands(&h.tx, vec![Command::Quit]).await;

    h.session.run().await.expect("clean shutdown");

    let log = h.playback.0.lock().unwrap();
    assert!(log.rates.is_empty());
    assert!(log.seeks.is_empty());
    assert_eq!(log.flushes, 0);
    assert_eq!(log.refreshes, 0, "a skipped message is not a command");

    // The malformed cycle still published a snapshot, with autoplay intact.
    let snapshots = h.sink.0.lock().unwrap();
    assert_eq!(snapshots[0].playing, Some(true));
    assert_eq!(snapshots[0].play_rate, Some(1.0));
}

#[tokio::test]
async fn test_every_command_cycle_requests_a_refresh() {
    let mut h = harness_with_peer(false);
    send_commands(
        &h.tx,
        vec![
            Command::PlayRate { rate: 2.0 },
            Command::Unknown { tag: 0x66 },
            Command::Quit,
        ],
    )
    .await;

    h.session.run().await.expect("clean shutdown");

    assert_eq!(
        h.playback.0.lock().unwrap().refreshes,
        3,
        "refresh fires even for the ignored command"
    );
}

#[tokio::test(start_paused = true)]
async fn test_idle_loop_publishes_about_once_per_second() {
    let h = harness_with_peer(false);
    let Harness {
        tx,
        sink,
        mut session,
        ..
    } = h;

    let handle = tokio::spawn(async move { session.run().await });

    // Three and a half virtual seconds with no traffic.
    tokio::time::sleep(Duration::from_millis(3500)).await;
    tx.send(ChannelEvent::Command(Command::Quit)).await.unwrap();

    handle.await.unwrap().expect("clean shutdown");

    let count = sink.0.lock().unwrap().len();
    assert!(
        (4..=5).contains(&count),
        "expected ~1 Hz idle publishing plus the quit cycle, got {count}"
    );
}

#[tokio::test]
async fn test_fatal_oversized_event_carries_exit_code_4() {
    let mut h = harness_with_peer(false);
    h.tx.send(ChannelEvent::Fatal(ChannelError::Oversized {
        declared: 1_048_576,
        max: 1_048_576,
    }))
    .await
    .unwrap();

    let err = h.session.run().await.expect_err("fatal");
    assert_eq!(err.exit_code(), 4);
}
