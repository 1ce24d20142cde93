//! Decode throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feed_client::{Decoder, FrameBuffer, Packet, PACKET_SIZE};

fn create_packet_buffer(packet_count: usize) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(packet_count * PACKET_SIZE);

    for seq in 1..=packet_count as u32 {
        let packet = Packet {
            symbol: *b"MSFT",
            side: if seq % 2 == 0 { b'B' } else { b'S' },
            quantity: seq * 10,
            price: 100_00 + seq,
            sequence: seq,
        };
        buffer.extend_from_slice(&packet.encode());
    }

    buffer
}

fn bench_decode_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_throughput");

    for packet_count in [1000, 10000, 100000].iter() {
        let buffer = black_box(create_packet_buffer(*packet_count));

        group.bench_with_input(
            BenchmarkId::from_parameter(packet_count),
            packet_count,
            |b, _| {
                b.iter(|| {
                    let mut count = 0;
                    Decoder::decode_stream(&buffer, |_| {
                        count += 1;
                        true
                    });
                    count
                });
            },
        );
    }

    group.finish();
}

fn bench_decode_single(c: &mut Criterion) {
    let buffer = create_packet_buffer(1);

    c.bench_function("decode_packet", |b| {
        b.iter(|| Decoder::decode_packet(black_box(&buffer)))
    });
}

fn bench_frame_buffer_split_reads(c: &mut Criterion) {
    let buffer = create_packet_buffer(10000);

    // Read sizes that never line up with frame boundaries
    c.bench_function("frame_buffer_split_reads", |b| {
        b.iter(|| {
            let mut frames = FrameBuffer::new();
            let mut out = Vec::with_capacity(10000);
            for chunk in buffer.chunks(1460) {
                frames.push(black_box(chunk), &mut out);
            }
            out.len()
        })
    });
}

criterion_group!(
    benches,
    bench_decode_throughput,
    bench_decode_single,
    bench_frame_buffer_split_reads
);
criterion_main!(benches);
