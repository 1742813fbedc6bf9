//! Native-messaging framing: a u32 length in native byte order, then a UTF-8
//! JSON body of exactly that many bytes.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame accepted in either direction (agent → client limit of the
/// native-messaging transport).
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame exceeds {max_bytes} bytes (got {frame_bytes})")]
    TooLarge {
        frame_bytes: usize,
        max_bytes: usize,
    },
    #[error("invalid JSON frame: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("frame I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize `message` into a complete frame (header + body).
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, FrameError> {
    let body = serde_json::to_vec(message)?;
    let len = u32::try_from(body.len())
        .ok()
        .filter(|_| body.len() <= MAX_FRAME_BYTES)
        .ok_or(FrameError::TooLarge {
            frame_bytes: body.len(),
            max_bytes: MAX_FRAME_BYTES,
        })?;
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&len.to_ne_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Write one message as a frame and flush.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame body. Returns `Ok(None)` when the stream ends at (or inside)
/// a frame header, i.e. the peer closed its side.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0_u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let frame_bytes = u32::from_ne_bytes(header) as usize;
    if frame_bytes > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge {
            frame_bytes,
            max_bytes: MAX_FRAME_BYTES,
        });
    }
    let mut body = vec![0_u8; frame_bytes];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Read one frame and parse it as JSON.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>, FrameError>
where
    R: AsyncRead + Unpin,
{
    match read_frame(reader).await? {
        Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
        None => Ok(None),
    }
}
