//! Wire codec conformance tests

use byteorder::{BigEndian, ByteOrder};
use feed_client::{CallType, DecodeError, Decoder, FrameBuffer, Packet, Request, PACKET_SIZE};

fn create_frame(symbol: &[u8; 4], side: u8, qty: u32, price: u32, seq: u32) -> Vec<u8> {
    let mut msg = vec![0u8; PACKET_SIZE];
    msg[0..4].copy_from_slice(symbol);
    msg[4] = side;
    BigEndian::write_u32(&mut msg[5..9], qty);
    BigEndian::write_u32(&mut msg[9..13], price);
    BigEndian::write_u32(&mut msg[13..17], seq);
    msg
}

#[test]
fn test_decode_all_fields() {
    let msg = create_frame(b"AAPL", b'B', 100, 15_025, 1);
    let packet = Decoder::decode_packet(&msg).unwrap();

    assert_eq!(packet.symbol_str(), "AAPL");
    assert_eq!(packet.side_char(), 'B');
    assert_eq!(packet.quantity, 100);
    assert_eq!(packet.price, 15_025);
    assert_eq!(packet.sequence, 1);
}

#[test]
fn test_decode_is_big_endian() {
    let mut msg = create_frame(b"META", b'S', 0, 0, 0);
    msg[13..17].copy_from_slice(&[0x00, 0x00, 0x01, 0x02]);
    let packet = Decoder::decode_packet(&msg).unwrap();
    assert_eq!(packet.sequence, 258);
}

#[test]
fn test_decode_full_u32_range() {
    // Values with the top bit set must not be treated as signed
    let msg = create_frame(b"AMZN", b'B', u32::MAX, 0x8000_0000, u32::MAX);
    let packet = Decoder::decode_packet(&msg).unwrap();
    assert_eq!(packet.quantity, u32::MAX);
    assert_eq!(packet.price, 2_147_483_648);
    assert_eq!(packet.sequence, u32::MAX);
}

#[test]
fn test_symbol_bytes_copied_verbatim() {
    let msg = create_frame(&[0xff, b'X', 0x00, b' '], b'B', 1, 1, 1);
    let packet = Decoder::decode_packet(&msg).unwrap();
    assert_eq!(packet.symbol, [0xff, b'X', 0x00, b' ']);
}

#[test]
fn test_encode_reproduces_frame() {
    let msg = create_frame(b"NFLX", b'S', 77, 123_456, 9);
    let packet = Decoder::decode_packet(&msg).unwrap();
    assert_eq!(packet.encode().to_vec(), msg);
}

#[test]
fn test_wrong_lengths_rejected() {
    for len in [0, 1, 16, 18, 34] {
        let buf = vec![0u8; len];
        let result = Decoder::decode_packet(&buf);
        assert!(
            matches!(result, Err(DecodeError::InvalidLength { expected: 17, actual }) if actual == len),
            "length {} should be rejected",
            len
        );
    }
}

#[test]
fn test_decode_stream() {
    let mut buffer = create_frame(b"GOOG", b'B', 1, 10, 1);
    buffer.extend_from_slice(&create_frame(b"GOOG", b'S', 2, 20, 2));

    let mut count = 0;
    let mut last_seq = 0;
    let consumed = Decoder::decode_stream(&buffer, |packet| {
        count += 1;
        last_seq = packet.sequence;
        true
    });

    assert_eq!(consumed, 34);
    assert_eq!(count, 2);
    assert_eq!(last_seq, 2);
}

#[test]
fn test_decode_stream_stops_on_callback_false() {
    let mut buffer = Vec::new();
    for seq in 1..=3 {
        buffer.extend_from_slice(&create_frame(b"GOOG", b'B', 1, 1, seq));
    }

    let mut count = 0;
    let consumed = Decoder::decode_stream(&buffer, |_packet| {
        count += 1;
        count < 2
    });

    assert_eq!(count, 2);
    assert_eq!(consumed, 34);
}

#[test]
fn test_frame_buffer_byte_at_a_time() {
    let packets = [
        Packet { symbol: *b"ORCL", side: b'B', quantity: 5, price: 6, sequence: 1 },
        Packet { symbol: *b"ORCL", side: b'S', quantity: 7, price: 8, sequence: 2 },
    ];
    let bytes: Vec<u8> = packets.iter().flat_map(|p| p.encode()).collect();

    let mut frames = FrameBuffer::new();
    let mut out = Vec::new();
    for byte in &bytes {
        frames.push(std::slice::from_ref(byte), &mut out);
    }

    assert_eq!(out, packets.to_vec());
    assert_eq!(frames.pending(), 0);
}

#[test]
fn test_request_framing() {
    assert_eq!(Request::FetchAll.encode(), [CallType::FetchAll as u8, 0]);
    assert_eq!(Request::resend(3).unwrap().encode(), [2, 3]);
    assert!(Request::resend(300).is_err());

    for call in 1..=2u8 {
        let request = Request::decode([call, 5]).unwrap();
        assert_eq!(request.call_type() as u8, call);
    }
}
