// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Length-prefixed, checksummed frame codec.
//!
//! Frame layout: `[u32 BE payload length][u32 BE CRC32][JSON payload]`.
//! Size is checked before the payload buffer is allocated and the checksum is
//! verified on every read. Any framing error is fatal for the connection.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::protocol::Message;
use crate::error::{BridgeError, BridgeResult, FrameError};

/// Bytes of header preceding every payload.
pub const HEADER_LEN: usize = 8;

/// Default maximum payload size (512 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;
/// Smallest configurable frame limit (1 KiB).
pub const MIN_FRAME_SIZE: usize = 1024;
/// Largest configurable frame limit (1 GiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024 * 1024;

/// Encoder/decoder for bridge frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Calculate the CRC32 checksum of a payload.
    pub fn checksum(payload: &[u8]) -> u32 {
        crc32fast::hash(payload)
    }

    /// Verify a payload against the checksum from its header.
    pub fn validate_checksum(payload: &[u8], expected: u32) -> Result<(), FrameError> {
        let actual = Self::checksum(payload);

        if actual != expected {
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }

        Ok(())
    }

    fn check_size(&self, size: usize) -> Result<(), FrameError> {
        if size > self.max_frame_size {
            return Err(FrameError::TooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        Ok(())
    }

    /// Serialize a message into a complete frame.
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, FrameError> {
        let payload = serde_json::to_vec(message)?;
        self.check_size(payload.len())?;

        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(&Self::checksum(&payload).to_be_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Parse a payload whose header has already been read.
    pub fn decode_payload(&self, payload: &[u8], checksum: u32) -> Result<Message, FrameError> {
        self.check_size(payload.len())?;
        Self::validate_checksum(payload, checksum)?;
        Ok(serde_json::from_slice(payload)?)
    }

    /// Write one message as a frame and flush.
    pub async fn write_frame<W>(&self, writer: &mut W, message: &Message) -> BridgeResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let frame = self.encode(message)?;
        writer
            .write_all(&frame)
            .await
            .map_err(|e| BridgeError::io("writing frame", e))?;
        writer
            .flush()
            .await
            .map_err(|e| BridgeError::io("flushing frame", e))
    }

    /// Read one frame. Returns `None` when the peer closed cleanly between frames.
    pub async fn read_frame<R>(&self, reader: &mut R) -> BridgeResult<Option<Message>>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; HEADER_LEN];
        let mut filled = 0;
        while filled < HEADER_LEN {
            let n = reader
                .read(&mut header[filled..])
                .await
                .map_err(|e| BridgeError::io("reading frame header", e))?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(FrameError::Truncated.into());
            }
            filled += n;
        }

        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let checksum = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        self.check_size(length)?;

        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                BridgeError::Frame(FrameError::Truncated)
            } else {
                BridgeError::io("reading frame payload", e)
            }
        })?;

        Ok(Some(self.decode_payload(&payload, checksum)?))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::Value;

    fn sample() -> Message {
        Message::Return {
            id: 3,
            result: Value::Bytes(vec![0xAB; 64]),
        }
    }

    #[test]
    fn test_checksum_validation() {
        let payload = b"Hello, World!";
        let checksum = FrameCodec::checksum(payload);

        assert!(FrameCodec::validate_checksum(payload, checksum).is_ok());
        assert!(FrameCodec::validate_checksum(payload, checksum + 1).is_err());
    }

    #[test]
    fn test_header_layout() {
        let frame = FrameCodec::default().encode(&sample()).unwrap();
        let length = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(length, frame.len() - HEADER_LEN);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let codec = FrameCodec::default();
        let mut buffer = Vec::new();
        codec.write_frame(&mut buffer, &sample()).await.unwrap();
        codec
            .write_frame(&mut buffer, &Message::Error { id: 4, message: "boom".into() })
            .await
            .unwrap();

        let mut reader = buffer.as_slice();
        assert_eq!(codec.read_frame(&mut reader).await.unwrap(), Some(sample()));
        assert!(matches!(
            codec.read_frame(&mut reader).await.unwrap(),
            Some(Message::Error { id: 4, .. })
        ));
        assert_eq!(codec.read_frame(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupted_payload_rejected() {
        let codec = FrameCodec::default();
        let mut frame = codec.encode(&sample()).unwrap();
        let last = frame.len() - 2;
        frame[last] ^= 0xFF;

        let err = codec.read_frame(&mut frame.as_slice()).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Frame(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected_before_read() {
        let small = FrameCodec::new(16);
        assert!(matches!(
            small.encode(&sample()),
            Err(FrameError::TooLarge { max: 16, .. })
        ));

        let frame = FrameCodec::default().encode(&sample()).unwrap();
        let err = small.read_frame(&mut &frame[..HEADER_LEN]).await.unwrap_err();
        assert!(matches!(err, BridgeError::Frame(FrameError::TooLarge { .. })));
    }

    #[tokio::test]
    async fn test_truncated_frame() {
        let codec = FrameCodec::default();
        let frame = codec.encode(&sample()).unwrap();

        let err = codec.read_frame(&mut &frame[..5]).await.unwrap_err();
        assert!(matches!(err, BridgeError::Frame(FrameError::Truncated)));

        let err = codec
            .read_frame(&mut &frame[..frame.len() - 1])
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Frame(FrameError::Truncated)));
    }
}
