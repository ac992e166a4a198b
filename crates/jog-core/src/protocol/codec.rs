//! Binary codec for encoding and decoding transport-control messages.
//!
//! Wire format, byte-stream flavor:
//! ```text
//! [length:4][schema:1][payload:N-1]
//! ```
//! The length prefix counts the bytes that follow it (schema byte included)
//! and uses the machine's native byte order, matching the conduit's single
//! co-resident peer.  All payload fields are big-endian.
//!
//! The datagram flavor carries the bare `[schema:1][payload]` with no length
//! prefix; one datagram is one message.
//!
//! The codec performs no I/O: it operates on already-read buffers only.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::media::{MediaDescription, StreamDescription};
use crate::protocol::messages::{
    ChannelMessage, Command, CommandType, StatusSnapshot, LENGTH_PREFIX_SIZE, MAX_MESSAGE_SIZE,
    SCHEMA_COMMAND, SCHEMA_STATUS,
};

/// Errors that can occur while decoding a message.
///
/// Decode failures are recoverable at the session level: the offending
/// message is skipped and the poll loop continues.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// Fewer bytes are available than the message requires.
    #[error("truncated message: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    /// The bytes cannot be parsed as the expected schema.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

// ── Presence flags ────────────────────────────────────────────────────────────

const STATUS_HAS_PLAYING: u8 = 1 << 0;
const STATUS_HAS_POSITION: u8 = 1 << 1;
const STATUS_HAS_DURATION: u8 = 1 << 2;
const STATUS_HAS_FRAME_RATE: u8 = 1 << 3;
const STATUS_HAS_PLAY_RATE: u8 = 1 << 4;

const MEDIA_HAS_TOTAL_CHANNELS: u8 = 1 << 0;
const MEDIA_HAS_FRAME_RATE: u8 = 1 << 1;

const STREAM_KIND_UNKNOWN: u8 = 0x00;
const STREAM_KIND_AUDIO: u8 = 0x01;
const STREAM_KIND_VIDEO: u8 = 0x02;

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a message into its schema-tagged payload (no length prefix).
///
/// Encoding is deterministic: the same logical message always produces the
/// same bytes.
pub fn encode_payload(msg: &ChannelMessage) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(msg.schema_tag());
    match msg {
        ChannelMessage::Command(c) => encode_command(&mut buf, c),
        ChannelMessage::Status(s) => encode_status(&mut buf, s),
    }
    buf
}

/// Encodes a message with the 4-byte native-order length prefix used by
/// byte-stream conduits.
pub fn encode_framed(msg: &ChannelMessage) -> Vec<u8> {
    let payload = encode_payload(msg);
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&payload);
    buf
}

/// Decodes one schema-tagged payload (no length prefix).
///
/// # Errors
///
/// Returns [`DecodeError`] if the bytes are malformed.
pub fn decode_payload(payload: &[u8]) -> Result<ChannelMessage, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Truncated {
            needed: 1,
            available: 0,
        });
    }
    let body = &payload[1..];
    match payload[0] {
        SCHEMA_COMMAND => decode_command(body).map(ChannelMessage::Command),
        SCHEMA_STATUS => decode_status(body).map(ChannelMessage::Status),
        other => Err(DecodeError::Malformed(format!(
            "unknown schema tag: 0x{other:02X}"
        ))),
    }
}

/// Decodes one length-prefixed message from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (prefix + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when fewer bytes are available than the
/// declared length, and [`DecodeError::Malformed`] when the payload cannot be
/// parsed.
pub fn decode_framed(bytes: &[u8]) -> Result<(ChannelMessage, usize), DecodeError> {
    if bytes.len() < LENGTH_PREFIX_SIZE {
        return Err(DecodeError::Truncated {
            needed: LENGTH_PREFIX_SIZE,
            available: bytes.len(),
        });
    }
    let declared = u32::from_ne_bytes(bytes[..LENGTH_PREFIX_SIZE].try_into().unwrap()) as usize;
    if declared > MAX_MESSAGE_SIZE {
        return Err(DecodeError::Malformed(format!(
            "declared length {declared} exceeds the {MAX_MESSAGE_SIZE} byte limit"
        )));
    }
    let total = LENGTH_PREFIX_SIZE + declared;
    if bytes.len() < total {
        return Err(DecodeError::Truncated {
            needed: total,
            available: bytes.len(),
        });
    }
    let msg = decode_payload(&bytes[LENGTH_PREFIX_SIZE..total])?;
    Ok((msg, total))
}

// ── Command encoding ──────────────────────────────────────────────────────────

fn encode_command(buf: &mut Vec<u8>, c: &Command) {
    buf.push(c.tag());
    match c {
        Command::Pause { resume_at } => match resume_at {
            Some(position) => {
                buf.push(0x01);
                buf.extend_from_slice(&position.to_be_bytes());
            }
            None => buf.push(0x00),
        },
        Command::Play { rate } | Command::PlayRate { rate } => {
            buf.extend_from_slice(&rate.to_be_bytes());
        }
        Command::Seek { position } => buf.extend_from_slice(&position.to_be_bytes()),
        Command::SeekRelative { delta } => buf.extend_from_slice(&delta.to_be_bytes()),
        Command::Quit | Command::Unknown { .. } => {}
    }
}

fn decode_command(p: &[u8]) -> Result<Command, DecodeError> {
    require_len(p, 1, "Command")?;
    let tag = p[0];
    let body = &p[1..];
    match CommandType::try_from(tag) {
        Ok(CommandType::Pause) => {
            require_len(body, 1, "Pause")?;
            let resume_at = if body[0] != 0 {
                Some(read_i64(body, 1)?)
            } else {
                None
            };
            Ok(Command::Pause { resume_at })
        }
        Ok(CommandType::Play) => Ok(Command::Play {
            rate: read_f64(body, 0)?,
        }),
        Ok(CommandType::PlayRate) => Ok(Command::PlayRate {
            rate: read_f64(body, 0)?,
        }),
        Ok(CommandType::Seek) => Ok(Command::Seek {
            position: read_i64(body, 0)?,
        }),
        Ok(CommandType::SeekRelative) => Ok(Command::SeekRelative {
            delta: read_i64(body, 0)?,
        }),
        Ok(CommandType::Quit) => Ok(Command::Quit),
        // Unrecognized tags decode to a variant the dispatcher ignores.
        Err(()) => Ok(Command::Unknown { tag }),
    }
}

// ── Status encoding ───────────────────────────────────────────────────────────

fn encode_status(buf: &mut Vec<u8>, s: &StatusSnapshot) {
    let mut flags = 0u8;
    if s.playing.is_some() {
        flags |= STATUS_HAS_PLAYING;
    }
    if s.position.is_some() {
        flags |= STATUS_HAS_POSITION;
    }
    if s.duration.is_some() {
        flags |= STATUS_HAS_DURATION;
    }
    if s.frame_rate.is_some() {
        flags |= STATUS_HAS_FRAME_RATE;
    }
    if s.play_rate.is_some() {
        flags |= STATUS_HAS_PLAY_RATE;
    }
    buf.push(flags);

    if let Some(playing) = s.playing {
        buf.push(playing as u8);
    }
    if let Some(position) = s.position {
        buf.extend_from_slice(&position.to_be_bytes());
    }
    if let Some(duration) = s.duration {
        buf.extend_from_slice(&duration.to_be_bytes());
    }
    if let Some(frame_rate) = s.frame_rate {
        buf.extend_from_slice(&frame_rate.to_be_bytes());
    }
    if let Some(play_rate) = s.play_rate {
        buf.extend_from_slice(&play_rate.to_be_bytes());
    }
    encode_media(buf, &s.media);
}

fn decode_status(p: &[u8]) -> Result<StatusSnapshot, DecodeError> {
    require_len(p, 1, "StatusSnapshot")?;
    let flags = p[0];
    let mut off = 1;

    let playing = if flags & STATUS_HAS_PLAYING != 0 {
        require_len(p, off + 1, "StatusSnapshot.playing")?;
        let v = p[off] != 0;
        off += 1;
        Some(v)
    } else {
        None
    };
    let position = if flags & STATUS_HAS_POSITION != 0 {
        let v = read_i64(p, off)?;
        off += 8;
        Some(v)
    } else {
        None
    };
    let duration = if flags & STATUS_HAS_DURATION != 0 {
        let v = read_i64(p, off)?;
        off += 8;
        Some(v)
    } else {
        None
    };
    let frame_rate = if flags & STATUS_HAS_FRAME_RATE != 0 {
        let v = read_f64(p, off)?;
        off += 8;
        Some(v)
    } else {
        None
    };
    let play_rate = if flags & STATUS_HAS_PLAY_RATE != 0 {
        let v = read_f64(p, off)?;
        off += 8;
        Some(v)
    } else {
        None
    };
    let (media, _) = decode_media(p, off)?;

    Ok(StatusSnapshot {
        playing,
        position,
        duration,
        frame_rate,
        play_rate,
        media: Arc::new(media),
    })
}

// ── Media description encoding ────────────────────────────────────────────────

fn encode_media(buf: &mut Vec<u8>, m: &MediaDescription) {
    let mut flags = 0u8;
    if m.total_audio_channels.is_some() {
        flags |= MEDIA_HAS_TOTAL_CHANNELS;
    }
    if m.frame_rate.is_some() {
        flags |= MEDIA_HAS_FRAME_RATE;
    }
    buf.push(flags);
    if let Some(total) = m.total_audio_channels {
        buf.extend_from_slice(&total.to_be_bytes());
    }
    if let Some(rate) = m.frame_rate {
        buf.extend_from_slice(&rate.to_be_bytes());
    }

    buf.extend_from_slice(&(m.streams.len() as u32).to_be_bytes());
    for stream in &m.streams {
        match stream {
            StreamDescription::Unknown => buf.push(STREAM_KIND_UNKNOWN),
            StreamDescription::Audio { channels, language } => {
                buf.push(STREAM_KIND_AUDIO);
                buf.extend_from_slice(&channels.to_be_bytes());
                match language {
                    Some(lang) => {
                        buf.push(0x01);
                        write_length_prefixed_string(buf, lang);
                    }
                    None => buf.push(0x00),
                }
            }
            StreamDescription::Video {
                frame_rate,
                width,
                height,
            } => {
                buf.push(STREAM_KIND_VIDEO);
                buf.extend_from_slice(&frame_rate.to_be_bytes());
                buf.extend_from_slice(&width.to_be_bytes());
                buf.extend_from_slice(&height.to_be_bytes());
            }
        }
    }
}

fn decode_media(p: &[u8], mut off: usize) -> Result<(MediaDescription, usize), DecodeError> {
    require_len(p, off + 1, "MediaDescription")?;
    let flags = p[off];
    off += 1;

    let total_audio_channels = if flags & MEDIA_HAS_TOTAL_CHANNELS != 0 {
        let v = read_u32(p, off)?;
        off += 4;
        Some(v)
    } else {
        None
    };
    let frame_rate = if flags & MEDIA_HAS_FRAME_RATE != 0 {
        let v = read_f64(p, off)?;
        off += 8;
        Some(v)
    } else {
        None
    };

    let stream_count = read_u32(p, off)? as usize;
    off += 4;
    let mut streams = Vec::with_capacity(stream_count.min(64));
    for _ in 0..stream_count {
        require_len(p, off + 1, "StreamDescription")?;
        let kind = p[off];
        off += 1;
        let stream = match kind {
            STREAM_KIND_UNKNOWN => StreamDescription::Unknown,
            STREAM_KIND_AUDIO => {
                let channels = read_u32(p, off)?;
                off += 4;
                require_len(p, off + 1, "StreamDescription.language")?;
                let has_language = p[off] != 0;
                off += 1;
                let language = if has_language {
                    let (s, end) = read_length_prefixed_string(p, off)?;
                    off = end;
                    Some(s)
                } else {
                    None
                };
                StreamDescription::Audio { channels, language }
            }
            STREAM_KIND_VIDEO => {
                let frame_rate = read_f64(p, off)?;
                let width = read_u32(p, off + 8)?;
                let height = read_u32(p, off + 12)?;
                off += 16;
                StreamDescription::Video {
                    frame_rate,
                    width,
                    height,
                }
            }
            other => {
                return Err(DecodeError::Malformed(format!(
                    "unknown stream kind: 0x{other:02X}"
                )));
            }
        };
        streams.push(stream);
    }

    Ok((
        MediaDescription {
            streams,
            total_audio_channels,
            frame_rate,
        },
        off,
    ))
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize, context: &str) -> Result<(), DecodeError> {
    if buf.len() < needed {
        Err(DecodeError::Malformed(format!(
            "{context}: need {needed} bytes, got {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32, DecodeError> {
    if buf.len() < offset + 4 {
        return Err(DecodeError::Truncated {
            needed: offset + 4,
            available: buf.len(),
        });
    }
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

fn read_i64(buf: &[u8], offset: usize) -> Result<i64, DecodeError> {
    if buf.len() < offset + 8 {
        return Err(DecodeError::Truncated {
            needed: offset + 8,
            available: buf.len(),
        });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    Ok(i64::from_be_bytes(bytes))
}

fn read_f64(buf: &[u8], offset: usize) -> Result<f64, DecodeError> {
    if buf.len() < offset + 8 {
        return Err(DecodeError::Truncated {
            needed: offset + 8,
            available: buf.len(),
        });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    Ok(f64::from_be_bytes(bytes))
}

/// Writes a 2-byte length prefix followed by the UTF-8 string bytes.
fn write_length_prefixed_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u16::MAX as usize) as u16;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&bytes[..len as usize]);
}

/// Reads a 2-byte length prefix and then that many UTF-8 bytes.
/// Returns the string and the offset of the byte after the string.
fn read_length_prefixed_string(buf: &[u8], offset: usize) -> Result<(String, usize), DecodeError> {
    if buf.len() < offset + 2 {
        return Err(DecodeError::Malformed(format!(
            "need 2 bytes for string length at offset {offset}"
        )));
    }
    let len = u16::from_be_bytes([buf[offset], buf[offset + 1]]) as usize;
    let start = offset + 2;
    if buf.len() < start + len {
        return Err(DecodeError::Malformed(format!(
            "string of length {len} at offset {start} exceeds buffer"
        )));
    }
    let s = std::str::from_utf8(&buf[start..start + len])
        .map_err(|e| DecodeError::Malformed(format!("invalid UTF-8: {e}")))?
        .to_string();
    Ok((s, start + len))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
