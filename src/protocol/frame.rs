//! Frame-level I/O on an established byte stream.
//!
//! The header announces the exact body length, so frames are read with
//! exact-length reads rather than buffered re-assembly. The body is
//! opaque bytes at this layer; XML parsing happens in [`crate::codec`].

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::wire::{Header, HEADER_SIZE, MAX_BANNER_SIZE};
use crate::error::{GbxError, Result};

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame handle from the header.
    pub handle: u32,
    /// Body bytes (zero-copy via `bytes::Bytes`).
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(handle: u32, body: Bytes) -> Self {
        Self { handle, body }
    }

    /// Check whether this frame is a server-initiated callback.
    #[inline]
    pub fn is_callback(&self) -> bool {
        super::wire::is_callback_handle(self.handle)
    }
}

/// Build a complete frame as a single byte vector.
///
/// Encodes the header and appends the body into one contiguous buffer so
/// the write path issues a single `write_all`.
pub fn build_frame(handle: u32, body: &[u8]) -> Vec<u8> {
    let header = Header::new(body.len() as u32, handle);
    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(body);
    buf
}

/// Read one frame: exactly 8 header bytes, then exactly `body_length`
/// body bytes.
///
/// # Errors
///
/// - [`GbxError::Closed`] on EOF, including EOF mid-frame
/// - [`GbxError::TooLarge`] when `body_length` exceeds `max_body_size`
/// - [`GbxError::Io`] on any other I/O failure
pub async fn read_frame<R>(reader: &mut R, max_body_size: u32) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut head = [0u8; HEADER_SIZE];
    read_exact_or_closed(reader, &mut head).await?;

    // decode cannot fail on a full 8-byte buffer
    let header = Header::decode(&head).ok_or(GbxError::Closed)?;
    header.validate(max_body_size)?;

    let mut body = vec![0u8; header.body_length as usize];
    read_exact_or_closed(reader, &mut body).await?;

    Ok(Frame::new(header.handle, Bytes::from(body)))
}

/// Write one frame (header then body) as one logical unit.
///
/// `write_all` retries partial writes until completion. Callers must
/// serialize concurrent writers externally.
pub async fn write_frame<W>(writer: &mut W, handle: u32, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let buf = build_frame(handle, body);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the connect banner: a `u32` length (bounded to
/// [`MAX_BANNER_SIZE`]) followed by that many bytes of ASCII protocol
/// name.
///
/// The handshake deadline is applied by the caller via
/// `tokio::time::timeout`.
pub async fn read_banner<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    read_exact_or_closed(reader, &mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf);

    if len > MAX_BANNER_SIZE {
        return Err(GbxError::TooLarge {
            len,
            max: MAX_BANNER_SIZE,
        });
    }

    let mut name = vec![0u8; len as usize];
    read_exact_or_closed(reader, &mut name).await?;

    Ok(String::from_utf8_lossy(&name).into_owned())
}

async fn read_exact_or_closed<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(GbxError::Closed),
        Err(e) => Err(GbxError::Io(e)),
    }
}
