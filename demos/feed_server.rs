//! Local feed server for manual client runs
//!
//! Generates random packets, drops a share of them from the snapshot and
//! answers targeted resends for any generated sequence.
//!
//! Usage: feed_server [port] [packet_count] [drop_percent]

use feed_client::{Packet, Request, MAX_RESEND_SEQUENCE, REQUEST_SIZE};
use rand::Rng;
use std::collections::HashSet;
use std::env;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

const SYMBOLS: [&[u8; 4]; 4] = [b"MSFT", b"AAPL", b"AMZN", b"META"];

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let port: u16 = if args.len() > 1 {
        args[1].parse().unwrap_or(3000)
    } else {
        3000
    };

    let packet_count: u32 = if args.len() > 2 {
        args[2].parse::<u32>().unwrap_or(100).min(MAX_RESEND_SEQUENCE)
    } else {
        100
    };

    let drop_percent: u32 = if args.len() > 3 {
        args[3].parse::<u32>().unwrap_or(5).min(100)
    } else {
        5
    };

    let mut rng = rand::thread_rng();
    let mut packets = Vec::with_capacity(packet_count as usize);
    for sequence in 1..=packet_count {
        packets.push(Packet {
            symbol: *SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
            side: if rng.gen_bool(0.5) { b'B' } else { b'S' },
            quantity: rng.gen_range(1u32..1000),
            price: rng.gen_range(5_000u32..20_000),
            sequence,
        });
    }

    // Never drop the last packet so the client sees the full range
    let dropped: HashSet<u32> = (1..packet_count)
        .filter(|_| rng.gen_range(0..100) < drop_percent)
        .collect();

    println!(
        "Serving {} packets on port {} ({} withheld from snapshot: {:?})",
        packet_count,
        port,
        dropped.len(),
        {
            let mut d: Vec<_> = dropped.iter().copied().collect();
            d.sort_unstable();
            d
        }
    );

    let packets = Arc::new(packets);
    let dropped = Arc::new(dropped);
    let listener = TcpListener::bind(("127.0.0.1", port))?;

    for stream in listener.incoming() {
        let stream = stream?;
        let packets = Arc::clone(&packets);
        let dropped = Arc::clone(&dropped);
        thread::spawn(move || {
            if let Err(e) = handle(stream, &packets, &dropped) {
                eprintln!("connection error: {}", e);
            }
        });
    }

    Ok(())
}

fn handle(mut stream: TcpStream, packets: &[Packet], dropped: &HashSet<u32>) -> std::io::Result<()> {
    let mut frame = [0u8; REQUEST_SIZE];
    stream.read_exact(&mut frame)?;

    match Request::decode(frame) {
        Ok(Request::FetchAll) => {
            for packet in packets.iter().filter(|p| !dropped.contains(&p.sequence)) {
                stream.write_all(&packet.encode())?;
            }
        }
        Ok(Request::FetchOne(seq)) => {
            if let Some(packet) = packets.iter().find(|p| p.sequence == seq as u32) {
                stream.write_all(&packet.encode())?;
            }
        }
        Err(e) => eprintln!("bad request: {}", e),
    }

    stream.flush()
}
