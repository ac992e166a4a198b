//! Media description model and the one-shot metadata probe.
//!
//! [`probe`] runs exactly once, after the media source is opened and before
//! the poll loop starts.  Its result is wrapped in an `Arc` and embedded in
//! every subsequent status snapshot, never recomputed per frame.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Description of a single elementary stream in the media source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamDescription {
    Audio {
        channels: u32,
        language: Option<String>,
    },
    Video {
        frame_rate: f64,
        width: u32,
        height: u32,
    },
    /// A stream whose type the source does not report as audio or video.
    Unknown,
}

/// Immutable description of the opened media source.
///
/// Built once by [`probe`]; the stream count is always `streams.len()` and
/// the derived aggregates are computed at build time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaDescription {
    /// Per-stream descriptions, ordered by stream index.
    pub streams: Vec<StreamDescription>,
    /// Sum of all audio streams' channel counts; absent when the source has
    /// no audio stream at all.
    pub total_audio_channels: Option<u32>,
    /// Session frame rate, preferring the source's numerator/denominator
    /// ratio and falling back to the first video stream's own rate.
    pub frame_rate: Option<f64>,
}

impl MediaDescription {
    pub fn stream_count(&self) -> u32 {
        self.streams.len() as u32
    }
}

/// Typed, read-only accessor interface over the opened media source's
/// metadata, implemented by an adapter around the real playback framework.
///
/// Accessors return `None` when the source does not carry the field for the
/// given stream index.
pub trait MediaSource {
    /// Number of elementary streams in the source.
    fn stream_count(&self) -> u32;

    /// The raw stream type tag (`"audio"`, `"video"`, or anything else the
    /// container reports), if present.
    fn stream_kind(&self, index: u32) -> Option<String>;

    fn audio_channels(&self, index: u32) -> Option<u32>;
    fn audio_language(&self, index: u32) -> Option<String>;

    fn video_frame_rate(&self, index: u32) -> Option<f64>;
    fn video_width(&self, index: u32) -> Option<u32>;
    fn video_height(&self, index: u32) -> Option<u32>;

    /// The source-level frame rate as a numerator/denominator pair.
    fn frame_rate_ratio(&self) -> Option<(i32, i32)>;
}

/// Walks the source's per-stream metadata and builds the media description.
///
/// Streams with a missing type tag and streams with an unrecognized tag are
/// both represented as [`StreamDescription::Unknown`], keeping the stream
/// count equal to the source's.
pub fn probe(source: &dyn MediaSource) -> MediaDescription {
    let stream_count = source.stream_count();

    let mut frame_rate = match source.frame_rate_ratio() {
        Some((num, den)) if num > 0 && den > 0 => Some(f64::from(num) / f64::from(den)),
        _ => None,
    };

    let mut streams = Vec::with_capacity(stream_count as usize);
    let mut total_audio_channels: Option<u32> = None;

    for index in 0..stream_count {
        let stream = match source.stream_kind(index).as_deref() {
            Some("audio") => {
                let channels = source.audio_channels(index).unwrap_or(0);
                *total_audio_channels.get_or_insert(0) += channels;
                StreamDescription::Audio {
                    channels,
                    language: source.audio_language(index),
                }
            }
            Some("video") => {
                let rate = source.video_frame_rate(index).unwrap_or(0.0);
                if frame_rate.is_none() {
                    // No usable source-level ratio: the first video stream's
                    // own rate stands in.
                    frame_rate = Some(rate);
                }
                StreamDescription::Video {
                    frame_rate: rate,
                    width: source.video_width(index).unwrap_or(0),
                    height: source.video_height(index).unwrap_or(0),
                }
            }
            _ => StreamDescription::Unknown,
        };
        streams.push(stream);
    }

    debug!(
        streams = streams.len(),
        total_audio_channels, frame_rate, "probed media source"
    );

    MediaDescription {
        streams,
        total_audio_channels,
        frame_rate,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Table-driven media source for tests.
    #[derive(Default)]
    struct FakeSource {
        kinds: Vec<Option<&'static str>>,
        channels: Vec<Option<u32>>,
        languages: Vec<Option<&'static str>>,
        video_rates: Vec<Option<f64>>,
        sizes: Vec<Option<(u32, u32)>>,
        ratio: Option<(i32, i32)>,
    }

    impl FakeSource {
        fn push_audio(&mut self, channels: u32, language: Option<&'static str>) {
            self.kinds.push(Some("audio"));
            self.channels.push(Some(channels));
            self.languages.push(language);
            self.video_rates.push(None);
            self.sizes.push(None);
        }

        fn push_video(&mut self, rate: f64, width: u32, height: u32) {
            self.kinds.push(Some("video"));
            self.channels.push(None);
            self.languages.push(None);
            self.video_rates.push(Some(rate));
            self.sizes.push(Some((width, height)));
        }

        fn push_other(&mut self, kind: Option<&'static str>) {
            self.kinds.push(kind);
            self.channels.push(None);
            self.languages.push(None);
            self.video_rates.push(None);
            self.sizes.push(None);
        }
    }

    impl MediaSource for FakeSource {
        fn stream_count(&self) -> u32 {
            self.kinds.len() as u32
        }
        fn stream_kind(&self, index: u32) -> Option<String> {
            self.kinds[index as usize].map(str::to_string)
        }
        fn audio_channels(&self, index: u32) -> Option<u32> {
            self.channels[index as usize]
        }
        fn audio_language(&self, index: u32) -> Option<String> {
            self.languages[index as usize].map(str::to_string)
        }
        fn video_frame_rate(&self, index: u32) -> Option<f64> {
            self.video_rates[index as usize]
        }
        fn video_width(&self, index: u32) -> Option<u32> {
            self.sizes[index as usize].map(|(w, _)| w)
        }
        fn video_height(&self, index: u32) -> Option<u32> {
            self.sizes[index as usize].map(|(_, h)| h)
        }
        fn frame_rate_ratio(&self) -> Option<(i32, i32)> {
            self.ratio
        }
    }

    #[test]
    fn test_probe_audio_and_video_streams() {
        let mut source = FakeSource::default();
        source.push_audio(2, Some("eng"));
        source.push_video(30.0, 1920, 1080);
        source.ratio = Some((30, 1));

        let media = probe(&source);

        assert_eq!(media.stream_count(), 2);
        assert_eq!(media.total_audio_channels, Some(2));
        assert_eq!(media.frame_rate, Some(30.0));
        assert_eq!(
            media.streams[0],
            StreamDescription::Audio {
                channels: 2,
                language: Some("eng".to_string()),
            }
        );
        assert_eq!(
            media.streams[1],
            StreamDescription::Video {
                frame_rate: 30.0,
                width: 1920,
                height: 1080,
            }
        );
    }

    #[test]
    fn test_probe_sums_channels_across_audio_streams() {
        let mut source = FakeSource::default();
        source.push_audio(2, None);
        source.push_audio(6, Some("fra"));

        let media = probe(&source);

        assert_eq!(media.total_audio_channels, Some(8));
    }

    #[test]
    fn test_probe_without_audio_leaves_total_absent() {
        let mut source = FakeSource::default();
        source.push_video(25.0, 1280, 720);

        let media = probe(&source);

        assert_eq!(media.total_audio_channels, None);
    }

    #[test]
    fn test_probe_prefers_frame_rate_ratio_over_stream_rate() {
        let mut source = FakeSource::default();
        source.push_video(29.97, 1920, 1080);
        source.ratio = Some((24, 1));

        let media = probe(&source);

        assert_eq!(media.frame_rate, Some(24.0));
    }

    #[test]
    fn test_probe_falls_back_to_first_video_stream_rate() {
        let mut source = FakeSource::default();
        source.push_video(50.0, 1280, 720);
        source.push_video(25.0, 640, 360);
        source.ratio = Some((0, 1)); // non-positive numerator: unusable

        let media = probe(&source);

        assert_eq!(media.frame_rate, Some(50.0));
    }

    #[test]
    fn test_probe_normalizes_untagged_and_unrecognized_streams() {
        let mut source = FakeSource::default();
        source.push_other(Some("data"));
        source.push_other(None);

        let media = probe(&source);

        assert_eq!(media.stream_count(), 2);
        assert_eq!(media.streams[0], StreamDescription::Unknown);
        assert_eq!(media.streams[1], StreamDescription::Unknown);
    }

    #[test]
    fn test_probe_empty_source() {
        let source = FakeSource::default();

        let media = probe(&source);

        assert!(media.streams.is_empty());
        assert_eq!(media.total_audio_channels, None);
        assert_eq!(media.frame_rate, None);
    }

    #[test]
    fn test_probe_audio_with_missing_channel_count_defaults_to_zero() {
        let mut source = FakeSource::default();
        source.kinds.push(Some("audio"));
        source.channels.push(None);
        source.languages.push(None);
        source.video_rates.push(None);
        source.sizes.push(None);

        let media = probe(&source);

        assert_eq!(
            media.streams[0],
            StreamDescription::Audio {
                channels: 0,
                language: None,
            }
        );
        // An audio stream exists, so the aggregate is present even at zero.
        assert_eq!(media.total_audio_channels, Some(0));
    }
}
