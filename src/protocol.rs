//! Binary request/response format of the snapshot feed
//!
//! Request (client -> server): 2 bytes
//!   - call_type: u8 (1 = fetch all, 2 = fetch one)
//!   - resend_seq: u8 (target sequence for fetch one, 0 otherwise)
//!
//! Response (server -> client): 17 bytes per packet, big-endian integers
//!   - symbol: [u8; 4]
//!   - side: u8
//!   - quantity: u32
//!   - price: u32
//!   - sequence: u32

use byteorder::{BigEndian, ByteOrder};
use std::borrow::Cow;
use thiserror::Error;

pub const REQUEST_SIZE: usize = 2;
pub const PACKET_SIZE: usize = 17;
pub const SYMBOL_SIZE: usize = 4;

/// Largest sequence a resend request can address (single-byte field).
pub const MAX_RESEND_SEQUENCE: u32 = u8::MAX as u32;

// Field offsets within a packet
pub(crate) const SIDE_OFFSET: usize = 4;
pub(crate) const QUANTITY_OFFSET: usize = 5;
pub(crate) const PRICE_OFFSET: usize = 9;
pub(crate) const SEQUENCE_OFFSET: usize = 13;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("resend target {0} outside addressable range 1..=255")]
    ResendTargetOutOfRange(u32),

    #[error("invalid call type: {0}")]
    InvalidCallType(u8),
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    FetchAll = 1,
    FetchOne = 2,
}

impl CallType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(CallType::FetchAll),
            2 => Some(CallType::FetchOne),
            _ => None,
        }
    }
}

/// A client request frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Stream every packet the server holds
    FetchAll,
    /// Stream the single packet with this sequence number
    FetchOne(u8),
}

impl Request {
    /// Build a targeted resend request.
    ///
    /// The wire field is one byte wide, so sequences above 255 cannot be
    /// requested; they are rejected rather than truncated. Sequence 0 never
    /// exists in the feed and is rejected too.
    pub fn resend(sequence: u32) -> Result<Self, ProtocolError> {
        match u8::try_from(sequence) {
            Ok(seq) if seq > 0 => Ok(Request::FetchOne(seq)),
            _ => Err(ProtocolError::ResendTargetOutOfRange(sequence)),
        }
    }

    pub fn call_type(&self) -> CallType {
        match self {
            Request::FetchAll => CallType::FetchAll,
            Request::FetchOne(_) => CallType::FetchOne,
        }
    }

    pub fn encode(&self) -> [u8; REQUEST_SIZE] {
        match *self {
            Request::FetchAll => [CallType::FetchAll as u8, 0],
            Request::FetchOne(seq) => [CallType::FetchOne as u8, seq],
        }
    }

    /// Parse a request frame. Used by servers (tests, demo).
    pub fn decode(frame: [u8; REQUEST_SIZE]) -> Result<Self, ProtocolError> {
        match CallType::from_u8(frame[0]) {
            Some(CallType::FetchAll) => Ok(Request::FetchAll),
            Some(CallType::FetchOne) => Ok(Request::FetchOne(frame[1])),
            None => Err(ProtocolError::InvalidCallType(frame[0])),
        }
    }
}

/// One decoded market-data record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    pub symbol: [u8; SYMBOL_SIZE],
    pub side: u8,
    pub quantity: u32,
    /// Scaled integer; the feed does not describe the scale
    pub price: u32,
    pub sequence: u32,
}

impl Packet {
    /// Symbol as text; non-UTF-8 bytes are replaced
    pub fn symbol_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.symbol)
    }

    pub fn side_char(&self) -> char {
        self.side as char
    }

    /// Encode to the 17-byte wire layout (inverse of `Decoder::decode_frame`)
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut frame = [0u8; PACKET_SIZE];
        frame[..SYMBOL_SIZE].copy_from_slice(&self.symbol);
        frame[SIDE_OFFSET] = self.side;
        BigEndian::write_u32(&mut frame[QUANTITY_OFFSET..PRICE_OFFSET], self.quantity);
        BigEndian::write_u32(&mut frame[PRICE_OFFSET..SEQUENCE_OFFSET], self.price);
        BigEndian::write_u32(&mut frame[SEQUENCE_OFFSET..PACKET_SIZE], self.sequence);
        frame
    }
}
