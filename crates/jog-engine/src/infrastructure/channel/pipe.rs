//! Byte-stream channel flavor: framed commands on stdin, framed status on a
//! FIFO.
//!
//! A message is read by taking exactly 4 length-prefix bytes, then exactly
//! that many payload bytes; `read_exact` retries short reads until satisfied
//! or the conduit signals end-of-input.  End-of-input and I/O errors are
//! fatal: the channel has one non-redundant peer and no reconnect protocol.

use std::path::Path;

use async_trait::async_trait;
use jog_core::protocol::messages::{LENGTH_PREFIX_SIZE, MAX_MESSAGE_SIZE};
use jog_core::{decode_payload, encode_framed, ChannelMessage, DecodeError, StatusSnapshot};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::session::{ChannelError, ChannelEvent, StatusSink};

/// Spawns the task that reads framed commands from stdin and forwards them
/// as [`ChannelEvent`]s on `tx`.
///
/// The task ends after a fatal event or once the session drops the receiver.
pub fn spawn_command_reader(tx: mpsc::Sender<ChannelEvent>) {
    tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        loop {
            let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
            if let Err(e) = stdin.read_exact(&mut prefix).await {
                let _ = tx.send(ChannelEvent::Fatal(ChannelError::Read(e))).await;
                return;
            }
            // The prefix is native byte order: both ends share the machine.
            let declared = u32::from_ne_bytes(prefix) as usize;
            if declared > MAX_MESSAGE_SIZE {
                let _ = tx
                    .send(ChannelEvent::Fatal(ChannelError::Oversized {
                        declared,
                        max: MAX_MESSAGE_SIZE,
                    }))
                    .await;
                return;
            }

            let mut payload = vec![0u8; declared];
            if let Err(e) = stdin.read_exact(&mut payload).await {
                let _ = tx.send(ChannelEvent::Fatal(ChannelError::Read(e))).await;
                return;
            }

            let event = match decode_payload(&payload) {
                Ok(ChannelMessage::Command(command)) => {
                    debug!("received {command:?}");
                    ChannelEvent::Command(command)
                }
                Ok(ChannelMessage::Status(_)) => ChannelEvent::Malformed(DecodeError::Malformed(
                    "status schema on the command channel".to_string(),
                )),
                Err(e) => ChannelEvent::Malformed(e),
            };
            if tx.send(event).await.is_err() {
                return;
            }
        }
    });
}

/// Writes framed status snapshots to the driver's FIFO.
pub struct FifoStatusSink {
    file: tokio::fs::File,
}

impl FifoStatusSink {
    /// Opens the FIFO write-only.  Blocks until the driver opens the read
    /// end, like any FIFO writer.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Setup`] when the FIFO cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, ChannelError> {
        info!("opening status pipe: {}", path.display());
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(|source| ChannelError::Setup {
                endpoint: format!("status pipe {}", path.display()),
                source,
            })?;
        info!("status pipe opened");
        Ok(Self { file })
    }
}

#[async_trait]
impl StatusSink for FifoStatusSink {
    async fn publish(&mut self, snapshot: &StatusSnapshot) -> Result<(), ChannelError> {
        let frame = encode_framed(&ChannelMessage::Status(snapshot.clone()));
        self.file
            .write_all(&frame)
            .await
            .map_err(ChannelError::Write)?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_fifo_is_a_setup_error() {
        let result = FifoStatusSink::open(Path::new("/nonexistent/jog-status-0")).await;

        match result {
            Err(e @ ChannelError::Setup { .. }) => assert_eq!(e.exit_code(), 2),
            Err(other) => panic!("expected Setup error, got {other:?}"),
            Ok(_) => panic!("open must fail for a missing path"),
        }
    }

    #[test]
    fn test_reader_prefix_interpretation_matches_encoder_framing() {
        // The reader parses the prefix exactly the way encode_framed writes
        // it: native byte order, counting only the payload.
        use jog_core::Command;

        let frame = encode_framed(&ChannelMessage::Command(Command::Play { rate: 1.0 }));
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&frame[..LENGTH_PREFIX_SIZE]);

        let declared = u32::from_ne_bytes(prefix) as usize;
        assert_eq!(declared, frame.len() - LENGTH_PREFIX_SIZE);

        let decoded = decode_payload(&frame[LENGTH_PREFIX_SIZE..]).expect("payload decodes");
        assert_eq!(decoded, ChannelMessage::Command(Command::Play { rate: 1.0 }));
    }
}
