//! Table-driven media source.
//!
//! Implements the typed accessor interface the probe walks.  In production
//! this is an adapter over the playback framework's per-stream metadata; the
//! static variant here backs the demo binary and tests.

use jog_core::MediaSource;

#[derive(Debug, Default)]
struct StaticStream {
    kind: Option<String>,
    channels: Option<u32>,
    language: Option<String>,
    frame_rate: Option<f64>,
    width: Option<u32>,
    height: Option<u32>,
}

/// A media source whose metadata is fixed at construction.
#[derive(Debug, Default)]
pub struct StaticMediaSource {
    streams: Vec<StaticStream>,
    ratio: Option<(i32, i32)>,
}

impl StaticMediaSource {
    /// A typical single-program file: one 1080p video stream plus a stereo
    /// English audio track at 25 fps.
    pub fn stereo_1080p() -> Self {
        Self::default()
            .with_video(25.0, 1920, 1080)
            .with_audio(2, Some("eng"))
            .with_ratio(25, 1)
    }

    pub fn with_audio(mut self, channels: u32, language: Option<&str>) -> Self {
        self.streams.push(StaticStream {
            kind: Some("audio".to_string()),
            channels: Some(channels),
            language: language.map(str::to_string),
            ..Default::default()
        });
        self
    }

    pub fn with_video(mut self, frame_rate: f64, width: u32, height: u32) -> Self {
        self.streams.push(StaticStream {
            kind: Some("video".to_string()),
            frame_rate: Some(frame_rate),
            width: Some(width),
            height: Some(height),
            ..Default::default()
        });
        self
    }

    /// A stream the container reports under some other type tag.
    pub fn with_other(mut self, kind: &str) -> Self {
        self.streams.push(StaticStream {
            kind: Some(kind.to_string()),
            ..Default::default()
        });
        self
    }

    /// A stream with no type tag at all.
    pub fn with_untagged(mut self) -> Self {
        self.streams.push(StaticStream::default());
        self
    }

    pub fn with_ratio(mut self, num: i32, den: i32) -> Self {
        self.ratio = Some((num, den));
        self
    }

    fn stream(&self, index: u32) -> Option<&StaticStream> {
        self.streams.get(index as usize)
    }
}

impl MediaSource for StaticMediaSource {
    fn stream_count(&self) -> u32 {
        self.streams.len() as u32
    }

    fn stream_kind(&self, index: u32) -> Option<String> {
        self.stream(index).and_then(|s| s.kind.clone())
    }

    fn audio_channels(&self, index: u32) -> Option<u32> {
        self.stream(index).and_then(|s| s.channels)
    }

    fn audio_language(&self, index: u32) -> Option<String> {
        self.stream(index).and_then(|s| s.language.clone())
    }

    fn video_frame_rate(&self, index: u32) -> Option<f64> {
        self.stream(index).and_then(|s| s.frame_rate)
    }

    fn video_width(&self, index: u32) -> Option<u32> {
        self.stream(index).and_then(|s| s.width)
    }

    fn video_height(&self, index: u32) -> Option<u32> {
        self.stream(index).and_then(|s| s.height)
    }

    fn frame_rate_ratio(&self) -> Option<(i32, i32)> {
        self.ratio
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jog_core::{probe, StreamDescription};

    #[test]
    fn test_stereo_1080p_probes_to_two_streams() {
        let media = probe(&StaticMediaSource::stereo_1080p());

        assert_eq!(media.stream_count(), 2);
        assert_eq!(media.total_audio_channels, Some(2));
        assert_eq!(media.frame_rate, Some(25.0));
    }

    #[test]
    fn test_other_and_untagged_streams_probe_as_unknown() {
        let source = StaticMediaSource::default()
            .with_other("subtitle")
            .with_untagged();

        let media = probe(&source);

        assert_eq!(
            media.streams,
            vec![StreamDescription::Unknown, StreamDescription::Unknown]
        );
    }

    #[test]
    fn test_builder_preserves_stream_order() {
        let source = StaticMediaSource::default()
            .with_video(30.0, 1280, 720)
            .with_audio(6, None);

        let media = probe(&source);

        assert!(matches!(media.streams[0], StreamDescription::Video { .. }));
        assert!(matches!(media.streams[1], StreamDescription::Audio { .. }));
    }
}
