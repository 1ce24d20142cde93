//! Fixed-layout packet decoder
//!
//! Every response frame is exactly `PACKET_SIZE` bytes with big-endian
//! integer fields. Framing (deciding where a frame starts and ends) is the
//! stream reader's job; this module only maps whole frames to `Packet`s.

use crate::protocol::*;
use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid packet length: expected {expected} bytes, have {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Packet decoder
pub struct Decoder;

impl Decoder {
    /// Decode one complete frame. Infallible: the type guarantees the length.
    pub fn decode_frame(frame: &[u8; PACKET_SIZE]) -> Packet {
        let mut symbol = [0u8; SYMBOL_SIZE];
        symbol.copy_from_slice(&frame[..SYMBOL_SIZE]);

        Packet {
            symbol,
            side: frame[SIDE_OFFSET],
            quantity: BigEndian::read_u32(&frame[QUANTITY_OFFSET..PRICE_OFFSET]),
            price: BigEndian::read_u32(&frame[PRICE_OFFSET..SEQUENCE_OFFSET]),
            sequence: BigEndian::read_u32(&frame[SEQUENCE_OFFSET..PACKET_SIZE]),
        }
    }

    /// Decode a buffer that must hold exactly one frame
    pub fn decode_packet(buffer: &[u8]) -> DecodeResult<Packet> {
        let frame: &[u8; PACKET_SIZE] =
            buffer.try_into().map_err(|_| DecodeError::InvalidLength {
                expected: PACKET_SIZE,
                actual: buffer.len(),
            })?;
        Ok(Self::decode_frame(frame))
    }

    /// Decode consecutive whole frames from the front of `buffer`.
    ///
    /// Calls `callback` for each packet and stops early if it returns false.
    /// Returns the number of bytes consumed; any incomplete tail is left
    /// untouched for the caller to keep.
    pub fn decode_stream<F>(buffer: &[u8], mut callback: F) -> usize
    where
        F: FnMut(Packet) -> bool,
    {
        let mut consumed = 0;

        for chunk in buffer.chunks_exact(PACKET_SIZE) {
            // chunks_exact only yields PACKET_SIZE slices
            let frame: &[u8; PACKET_SIZE] = match chunk.try_into() {
                Ok(frame) => frame,
                Err(_) => break,
            };
            consumed += PACKET_SIZE;
            if !callback(Self::decode_frame(frame)) {
                break;
            }
        }

        consumed
    }
}
