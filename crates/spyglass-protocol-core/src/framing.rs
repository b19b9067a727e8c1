use crate::codec::{read_varint, CodecError};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

/// Hard cap on a single frame; anything larger is a corrupt stream.
const MAX_FRAME_LEN: usize = 1 << 21;

/// A varint-length-framed connection. Frame payloads are opaque here;
/// compression, encryption and packet ids belong to the versions on
/// either side of the translation pipeline.
pub struct FramedConnection {
    stream: TcpStream,
    read_buf: BytesMut,
}

impl FramedConnection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
        }
    }

    /// Read one complete frame payload (length prefix stripped).
    pub async fn read_frame(&mut self) -> anyhow::Result<BytesMut> {
        loop {
            if let Some(frame) = try_parse_frame(&mut self.read_buf)? {
                return Ok(frame);
            }
            let mut tmp = [0u8; 4096];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed"));
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }

    /// Write one frame with a varint length prefix.
    pub async fn write_frame(&mut self, payload: &[u8]) -> anyhow::Result<()> {
        let frame = build_frame(payload);
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Split into read and write halves for concurrent pumping.
    pub fn into_split(self) -> (FrameReader, FrameWriter) {
        let (read_half, write_half) = self.stream.into_split();
        (
            FrameReader {
                stream: read_half,
                read_buf: self.read_buf,
            },
            FrameWriter { stream: write_half },
        )
    }
}

/// Read half of a split framed connection.
pub struct FrameReader {
    stream: OwnedReadHalf,
    read_buf: BytesMut,
}

impl FrameReader {
    pub async fn read_frame(&mut self) -> anyhow::Result<BytesMut> {
        loop {
            if let Some(frame) = try_parse_frame(&mut self.read_buf)? {
                return Ok(frame);
            }
            let mut tmp = [0u8; 4096];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed"));
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }
}

/// Write half of a split framed connection.
pub struct FrameWriter {
    stream: OwnedWriteHalf,
}

impl FrameWriter {
    pub async fn write_frame(&mut self, payload: &[u8]) -> anyhow::Result<()> {
        let frame = build_frame(payload);
        self.stream.write_all(&frame).await?;
        Ok(())
    }
}

fn try_parse_frame(read_buf: &mut BytesMut) -> anyhow::Result<Option<BytesMut>> {
    if read_buf.is_empty() {
        return Ok(None);
    }

    let mut peek = read_buf.clone();
    let length = match read_varint(&mut peek) {
        Ok(len) => len as usize,
        Err(CodecError::NotEnoughData) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if length > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge(length, MAX_FRAME_LEN).into());
    }

    let prefix_len = read_buf.len() - peek.len();
    if peek.remaining() < length {
        return Ok(None);
    }

    read_buf.advance(prefix_len);
    let frame = read_buf.split_to(length);
    trace!("Read frame len={}", frame.len());
    Ok(Some(frame))
}

fn build_frame(payload: &[u8]) -> BytesMut {
    let mut frame = BytesMut::with_capacity(payload.len() + 5);
    crate::codec::write_varint(&mut frame, payload.len() as i32);
    frame.extend_from_slice(payload);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_waits_for_full_frame() {
        let mut buf = BytesMut::new();
        crate::codec::write_varint(&mut buf, 4);
        buf.extend_from_slice(&[1, 2]);
        assert!(try_parse_frame(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[3, 4]);
        let frame = try_parse_frame(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], &[1, 2, 3, 4]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_parse_two_back_to_back_frames() {
        let mut buf = BytesMut::new();
        for payload in [&[0xAAu8][..], &[0xBB, 0xCC][..]] {
            let frame = build_frame(payload);
            buf.extend_from_slice(&frame);
        }
        assert_eq!(&try_parse_frame(&mut buf).unwrap().unwrap()[..], &[0xAA]);
        assert_eq!(
            &try_parse_frame(&mut buf).unwrap().unwrap()[..],
            &[0xBB, 0xCC]
        );
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let mut buf = BytesMut::new();
        crate::codec::write_varint(&mut buf, (MAX_FRAME_LEN + 1) as i32);
        assert!(try_parse_frame(&mut buf).is_err());
    }
}
