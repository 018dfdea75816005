use std::io;

use criterion::{criterion_group, criterion_main, Criterion};

use httpry::capture::CapturedPacket;
use httpry::layers::http::HttpParser;
use httpry::packet::Timestamp;
use httpry::types::ENCAP_TYPE_ETH;
use httpry::{FieldRegistry, PacketDecoder, Pipeline, RecordEmitter, RecordFormat};

const HEAD_REQUEST: &str = "00e08100b02800096b88f5c90800450000c1d24940008006c85b0a000005cf2e865e0cc30050a80076877de014025018faf0ad62000048454144202f76342f69756964656e742e6361623f3033303730313132303820485454502f312e310d0a4163636570743a202a2f2a0d0a557365722d4167656e743a20496e6475737472792055706461746520436f6e74726f6c0d0a486f73743a2077696e646f77737570646174652e6d6963726f736f66742e636f6d0d0a436f6e6e656374696f6e3a204b6565702d416c6976650d0a0d0a";

pub fn decode_head_request(c: &mut Criterion) {
    let bytes = hex::decode(HEAD_REQUEST).unwrap();
    let decoder = PacketDecoder::new(ENCAP_TYPE_ETH).unwrap();
    let packet = CapturedPacket {
        data: &bytes,
        caplen: bytes.len() as u32,
        timestamp: Timestamp::new(1_175_000_000, 0),
    };

    c.bench_function("Decode_Ethernet_IPv4_TCP", |b| {
        b.iter(|| decoder.decode(&packet))
    });
}

pub fn parse_head_request(c: &mut Criterion) {
    let bytes = hex::decode(HEAD_REQUEST).unwrap();
    let payload = &bytes[54..];
    let mut parser = HttpParser::new();

    c.bench_function("Parse_HTTP_Request", |b| {
        b.iter(|| parser.parse(payload).map(|m| m.headers().count()))
    });
}

pub fn log_head_request(c: &mut Criterion) {
    let bytes = hex::decode(HEAD_REQUEST).unwrap();
    let packet = CapturedPacket {
        data: &bytes,
        caplen: bytes.len() as u32,
        timestamp: Timestamp::new(1_175_000_000, 0),
    };
    let registry = FieldRegistry::from_format_str(httpry::config::DEFAULT_FORMAT).unwrap();
    let emitter = RecordEmitter::new(io::sink(), RecordFormat::Tsv);
    let mut pipeline = Pipeline::new(
        PacketDecoder::new(ENCAP_TYPE_ETH).unwrap(),
        registry,
        emitter,
    );

    c.bench_function("Log_HTTP_Request", |b| {
        b.iter(|| pipeline.process(&packet))
    });
}

criterion_group!(
    http_packet,
    decode_head_request,
    parse_head_request,
    log_head_request
);
criterion_main!(http_packet);
