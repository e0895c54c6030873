//! Async line I/O for frames.
//!
//! Readers bound every line before decoding it, so a peer that never sends a
//! newline cannot make us buffer without limit.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    Frame,
    errors::{ProtocolError, Result},
};

/// Longest accepted line, excluding the terminating `\n`
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Read and decode one frame.
///
/// Returns `Ok(None)` on a clean end of stream. A final line without a
/// trailing newline is still decoded.
///
/// # Errors
///
/// - `LineTooLong` if no newline appears within [`MAX_LINE_LEN`] bytes
/// - `Io` if the underlying reader fails
/// - Any decode error from [`Frame::decode_bytes`]
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let limit = (MAX_LINE_LEN + 1) as u64;

    let read = (&mut *reader).take(limit).read_until(b'\n', &mut line).await?;
    if read == 0 {
        return Ok(None);
    }

    if line.last() != Some(&b'\n') && line.len() > MAX_LINE_LEN {
        return Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN });
    }

    Frame::decode_bytes(&line).map(Some)
}

/// Encode and write one frame, then flush.
///
/// # Errors
///
/// - `Io` if the underlying writer fails
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.encode().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameType;

    #[tokio::test]
    async fn reads_consecutive_frames() {
        let mut input: &[u8] = b"H 1 c3F1ZWxjaCBkaXJlY3Q=\nA 1 YWxpY2U=\n";

        let hello = read_frame(&mut input).await.unwrap().unwrap();
        assert_eq!(hello.frame_type, FrameType::Hello);

        let auth = read_frame(&mut input).await.unwrap().unwrap();
        assert_eq!(&auth.payload[..], b"alice");

        assert!(read_frame(&mut input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn decodes_final_line_without_newline() {
        let mut input: &[u8] = b"E 1 b29wcw==";
        let frame = read_frame(&mut input).await.unwrap().unwrap();
        assert_eq!(frame.payload_text().unwrap(), "oops");
    }

    #[tokio::test]
    async fn rejects_over_long_line() {
        let long = vec![b'A'; MAX_LINE_LEN + 10];
        let mut input: &[u8] = &long;

        let result = read_frame(&mut input).await;
        assert_eq!(result, Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN }));
    }

    #[tokio::test]
    async fn accepts_line_at_the_bound() {
        let payload = vec![0u8; (MAX_LINE_LEN - 4) / 4 * 3];
        let line = Frame::message(payload.clone()).encode();
        assert!(line.len() <= MAX_LINE_LEN + 1);

        let mut input: &[u8] = line.as_bytes();
        let frame = read_frame(&mut input).await.unwrap().unwrap();
        assert_eq!(frame.payload.len(), payload.len());
    }

    #[tokio::test]
    async fn malformed_line_is_a_decode_error() {
        let mut input: &[u8] = b"M 1\nH 1 \n";
        assert!(matches!(read_frame(&mut input).await, Err(ProtocolError::FieldCount { .. })));

        // The bad line was consumed; the stream stays usable.
        let next = read_frame(&mut input).await.unwrap().unwrap();
        assert_eq!(next.frame_type, FrameType::Hello);
    }

    #[tokio::test]
    async fn write_then_read() {
        let mut wire = Vec::new();
        write_frame(&mut wire, &Frame::error("unknown recipient")).await.unwrap();
        assert!(wire.ends_with(b"\n"));

        let mut input: &[u8] = &wire;
        let frame = read_frame(&mut input).await.unwrap().unwrap();
        assert_eq!(frame.payload_text().unwrap(), "unknown recipient");
    }
}
