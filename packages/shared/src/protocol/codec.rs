//! Length-prefixed frame codec.
//!
//! Every frame is a 4-byte big-endian body length followed by the body.
//! The decoder buffers partial frames until complete and yields coalesced
//! frames one at a time, so one logical message never depends on how the
//! underlying stream happened to split the bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum frame body size (64 KiB)
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

const LENGTH_PREFIX_SIZE: usize = 4;

/// Framing error. Any of these leaves the stream unsynchronised, so the
/// connection must be closed.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Codec turning a byte stream into frame bodies and back.
///
/// Used by both sides; the body is interpreted by
/// [`Request`](super::Request) on the server and
/// [`ServerMessage`](super::ServerMessage) on the client.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Create a codec with a custom body limit
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        // Peek at length without consuming
        let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if len > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        if src.len() < LENGTH_PREFIX_SIZE + len {
            src.reserve(LENGTH_PREFIX_SIZE + len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_SIZE);
        Ok(Some(src.split_to(len).freeze()))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: item.len(),
                max: self.max_frame_size,
            });
        }

        dst.reserve(LENGTH_PREFIX_SIZE + item.len());
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    fn encoded(body: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        FrameCodec::new()
            .encode(Bytes::copy_from_slice(body), &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_encode_writes_big_endian_length_prefix() {
        // テスト項目: エンコード結果の先頭 4 バイトが本文長 (BE) になる
        // given (前提条件):
        let body = b"1";

        // when (操作):
        let buf = encoded(body);

        // then (期待する結果):
        assert_eq!(&buf[..], &[0, 0, 0, 1, b'1']);
    }

    #[test]
    fn test_decode_waits_for_partial_frame() {
        // テスト項目: 本文が揃うまでデコードは None を返し、揃った時点でフレームを返す
        // given (前提条件):
        let full = encoded(b"5hello");
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&full[..3]);

        // when (操作):
        let first = codec.decode(&mut buf).unwrap();
        buf.extend_from_slice(&full[3..7]);
        let second = codec.decode(&mut buf).unwrap();
        buf.extend_from_slice(&full[7..]);
        let third = codec.decode(&mut buf).unwrap();

        // then (期待する結果):
        assert!(first.is_none());
        assert!(second.is_none());
        assert_eq!(third.as_deref(), Some(&b"5hello"[..]));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_splits_coalesced_frames() {
        // テスト項目: 1 回の受信に複数フレームが含まれても 1 つずつ取り出せる
        // given (前提条件):
        let mut buf = encoded(b"1");
        buf.extend_from_slice(&encoded(b"2lobby"));
        let mut codec = FrameCodec::new();

        // when (操作):
        let first = codec.decode(&mut buf).unwrap();
        let second = codec.decode(&mut buf).unwrap();
        let third = codec.decode(&mut buf).unwrap();

        // then (期待する結果):
        assert_eq!(first.as_deref(), Some(&b"1"[..]));
        assert_eq!(second.as_deref(), Some(&b"2lobby"[..]));
        assert!(third.is_none());
    }

    #[test]
    fn test_decode_accepts_empty_body() {
        // テスト項目: 長さ 0 のフレームは空の本文として取り出される
        // given (前提条件):
        let mut buf = BytesMut::from(&[0u8, 0, 0, 0][..]);

        // when (操作):
        let frame = FrameCodec::new().decode(&mut buf).unwrap();

        // then (期待する結果):
        assert_eq!(frame.map(|f| f.len()), Some(0));
    }

    #[test]
    fn test_decode_rejects_oversized_length() {
        // テスト項目: 上限を超える長さプレフィックスはエラーになる
        // given (前提条件):
        let mut codec = FrameCodec::with_max_frame_size(8);
        let mut buf = BytesMut::from(&[0u8, 0, 0, 9][..]);

        // when (操作):
        let result = codec.decode(&mut buf);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(CodecError::FrameTooLarge { size: 9, max: 8 })
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_body() {
        // テスト項目: 上限を超える本文はエンコードできない
        // given (前提条件):
        let mut codec = FrameCodec::with_max_frame_size(2);
        let mut buf = BytesMut::new();

        // when (操作):
        let result = codec.encode(Bytes::from_static(b"abc"), &mut buf);

        // then (期待する結果):
        assert!(matches!(result, Err(CodecError::FrameTooLarge { .. })));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_framed_stream_reassembles_fragmented_writes() {
        // テスト項目: ストリーム上で断片化された書き込みでも 1 フレームとして読める
        // given (前提条件):
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut framed = FramedRead::new(reader, FrameCodec::new());
        let bytes = encoded(b"4lobby");

        // when (操作):
        for chunk in bytes.chunks(2) {
            writer.write_all(chunk).await.unwrap();
            writer.flush().await.unwrap();
        }
        drop(writer);

        // then (期待する結果):
        let frame = framed.next().await.unwrap().unwrap();
        assert_eq!(&frame[..], b"4lobby");
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn test_framed_sink_and_stream_interoperate() {
        // テスト項目: FramedWrite で送った複数フレームが FramedRead で順に読める
        // given (前提条件):
        let (writer, reader) = tokio::io::duplex(1024);
        let mut sink = FramedWrite::new(writer, FrameCodec::new());
        let mut stream = FramedRead::new(reader, FrameCodec::new());

        // when (操作):
        sink.send(Bytes::from_static(b"1")).await.unwrap();
        sink.send(Bytes::from_static(b"5hey")).await.unwrap();

        // then (期待する結果):
        assert_eq!(&stream.next().await.unwrap().unwrap()[..], b"1");
        assert_eq!(&stream.next().await.unwrap().unwrap()[..], b"5hey");
    }
}
