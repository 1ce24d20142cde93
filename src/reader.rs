//! Stream reader: drains a connection into decoded packets
//!
//! The server never sends an end marker. A stream is finished when the peer
//! closes it or when the connection's read timeout fires with nothing new to
//! read; both are normal endings. Split reads are reassembled by a
//! per-connection `FrameBuffer`.

use crate::connection::TransportError;
use crate::decoder::Decoder;
use crate::protocol::{Packet, PACKET_SIZE};
use std::io::{ErrorKind, Read};
use tracing::{debug, warn};

const READ_CHUNK: usize = 4096;

/// How a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Orderly close by the peer
    Closed,
    /// Read timeout elapsed with no data
    Idle,
}

/// Byte accumulator that emits whole frames and keeps the remainder
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pending: Vec::with_capacity(PACKET_SIZE * 2),
        }
    }

    /// Append raw bytes and push every completed packet into `out`
    pub fn push(&mut self, bytes: &[u8], out: &mut Vec<Packet>) {
        self.pending.extend_from_slice(bytes);
        let consumed = Decoder::decode_stream(&self.pending, |packet| {
            out.push(packet);
            true
        });
        self.pending.drain(..consumed);
    }

    /// Bytes waiting for the rest of their frame
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Result of draining one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSummary {
    /// Packets in arrival order
    pub packets: Vec<Packet>,
    pub bytes_read: usize,
    /// Incomplete frame bytes left over when the stream ended
    pub trailing_bytes: usize,
    pub end: StreamEnd,
}

pub struct StreamReader<R> {
    inner: R,
    frames: FrameBuffer,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        StreamReader {
            inner,
            frames: FrameBuffer::new(),
        }
    }

    /// Read until close, idle timeout or a transport error
    pub fn drain(mut self) -> Result<ReadSummary, TransportError> {
        let mut packets = Vec::new();
        let mut bytes_read = 0;
        let mut buf = [0u8; READ_CHUNK];

        let end = loop {
            match self.inner.read(&mut buf) {
                Ok(0) => break StreamEnd::Closed,
                Ok(n) => {
                    bytes_read += n;
                    self.frames.push(&buf[..n], &mut packets);
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    break StreamEnd::Idle;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Receive(e)),
            }
        };

        let trailing_bytes = self.frames.pending();
        if trailing_bytes > 0 {
            warn!(trailing_bytes, "stream ended inside a frame; partial bytes dropped");
        }
        debug!(?end, packets = packets.len(), bytes_read, "stream drained");

        Ok(ReadSummary {
            packets,
            bytes_read,
            trailing_bytes,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Hands out scripted chunks, then a final outcome
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
        end: Option<ErrorKind>,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => match self.end {
                    Some(kind) => Err(io::Error::new(kind, "scripted")),
                    None => Ok(0),
                },
            }
        }
    }

    fn packet(seq: u32) -> Packet {
        Packet {
            symbol: *b"ABCD",
            side: b'B',
            quantity: seq * 10,
            price: 100 + seq,
            sequence: seq,
        }
    }

    fn stream_of(seqs: &[u32]) -> Vec<u8> {
        seqs.iter().flat_map(|&s| packet(s).encode()).collect()
    }

    #[test]
    fn test_drain_until_close() {
        let reader = ChunkedReader {
            chunks: VecDeque::from(vec![stream_of(&[1, 2, 3])]),
            end: None,
        };
        let summary = StreamReader::new(reader).drain().unwrap();
        assert_eq!(summary.end, StreamEnd::Closed);
        assert_eq!(summary.packets, vec![packet(1), packet(2), packet(3)]);
        assert_eq!(summary.bytes_read, 51);
        assert_eq!(summary.trailing_bytes, 0);
    }

    #[test]
    fn test_idle_timeout_is_normal_end() {
        for kind in [ErrorKind::WouldBlock, ErrorKind::TimedOut] {
            let reader = ChunkedReader {
                chunks: VecDeque::from(vec![stream_of(&[7])]),
                end: Some(kind),
            };
            let summary = StreamReader::new(reader).drain().unwrap();
            assert_eq!(summary.end, StreamEnd::Idle);
            assert_eq!(summary.packets, vec![packet(7)]);
        }
    }

    #[test]
    fn test_split_frames_are_reassembled() {
        let bytes = stream_of(&[1, 2]);
        // 5 + 20 + 9 = 34 bytes, no chunk aligned to a frame boundary
        let reader = ChunkedReader {
            chunks: VecDeque::from(vec![
                bytes[..5].to_vec(),
                bytes[5..25].to_vec(),
                bytes[25..].to_vec(),
            ]),
            end: None,
        };
        let summary = StreamReader::new(reader).drain().unwrap();
        assert_eq!(summary.packets, vec![packet(1), packet(2)]);
    }

    #[test]
    fn test_trailing_partial_frame_reported() {
        let mut bytes = stream_of(&[1]);
        bytes.extend_from_slice(&[1, 2, 3]);
        let reader = ChunkedReader {
            chunks: VecDeque::from(vec![bytes]),
            end: None,
        };
        let summary = StreamReader::new(reader).drain().unwrap();
        assert_eq!(summary.packets.len(), 1);
        assert_eq!(summary.trailing_bytes, 3);
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        struct InterruptOnce {
            interrupted: bool,
            data: io::Cursor<Vec<u8>>,
        }
        impl Read for InterruptOnce {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
                }
                self.data.read(buf)
            }
        }

        let reader = InterruptOnce {
            interrupted: false,
            data: io::Cursor::new(stream_of(&[4])),
        };
        let summary = StreamReader::new(reader).drain().unwrap();
        assert_eq!(summary.packets, vec![packet(4)]);
    }

    #[test]
    fn test_transport_error_propagates() {
        let reader = ChunkedReader {
            chunks: VecDeque::new(),
            end: Some(ErrorKind::ConnectionReset),
        };
        let result = StreamReader::new(reader).drain();
        assert!(matches!(result, Err(TransportError::Receive(_))));
    }

    #[test]
    fn test_empty_stream() {
        let summary = StreamReader::new(io::empty()).drain().unwrap();
        assert!(summary.packets.is_empty());
        assert_eq!(summary.end, StreamEnd::Closed);
    }
}
