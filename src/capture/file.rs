//! pcap and pcapng file reader

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use pcap_parser::traits::{PcapNGPacketBlock, PcapReaderIterator};
use pcap_parser::{create_reader, Block, PcapBlockOwned, PcapError};

use crate::capture::{CapturedPacket, PacketSource, SourceEvent};
use crate::errors::Error;
use crate::packet::Timestamp;
use crate::types::{EncapType, ENCAP_TYPE_ETH};

/// Initial reader buffer, holds a full 262144 byte snaplen record.
const PCAP_BUFFER_SIZE: usize = 262144 + 4096;
/// The buffer doubles for larger blocks, up to this size.
const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

const MICROS_PER_SEC: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

// Link type and timestamp encoding of one capture interface. A legacy file has exactly one.
#[derive(Debug, Clone, Copy)]
struct Interface {
    encap: EncapType,
    // Timestamp units per second
    resolution: u64,
    offset: u64,
}

impl Interface {
    fn timestamp(&self, secs: u32, fraction: u32) -> Timestamp {
        let usecs = fraction as u64 * MICROS_PER_SEC / self.resolution.max(1);
        Timestamp::new(secs as i64, usecs as i64)
    }
}

enum BlockEvent {
    Frame {
        if_id: usize,
        caplen: u32,
        timestamp: Timestamp,
    },
    Meta,
    Eof,
}

/// Reads frames from a legacy pcap or a pcapng capture file.
///
/// All frames are handed to a decoder built for [`encap_type`][`PacketSource::encap_type`], the
/// link type of the first interface. pcapng frames captured on an interface of another link
/// type are skipped.
pub struct FileSource {
    reader: Box<dyn PcapReaderIterator>,
    buffer_size: usize,
    encap: EncapType,
    interfaces: Vec<Interface>,
    frame: Vec<u8>,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Capture(format!("cannot open capture file '{}': {}", path.display(), e))
        })?;

        Self::new(BufReader::new(file))
    }

    /// Wrap a reader positioned at the start of a capture file. Blocks are read up to the first
    /// link-layer header, so the link type is known before the first frame.
    pub fn new<R: Read + 'static>(reader: R) -> Result<Self, Error> {
        let reader = create_reader(PCAP_BUFFER_SIZE, reader)
            .map_err(|e| Error::Capture(format!("not a valid pcap or pcapng file: {:?}", e)))?;

        let mut source = Self {
            reader,
            buffer_size: PCAP_BUFFER_SIZE,
            encap: ENCAP_TYPE_ETH,
            interfaces: Vec::new(),
            frame: Vec::with_capacity(PCAP_BUFFER_SIZE),
        };

        loop {
            match source.read_block()? {
                BlockEvent::Meta => {
                    if let Some(interface) = source.interfaces.first() {
                        source.encap = interface.encap;
                        break;
                    }
                }
                BlockEvent::Frame { .. } => {
                    return Err(Error::Capture(
                        "packet found before the link-layer header".to_string(),
                    ))
                }
                BlockEvent::Eof => {
                    log::debug!("capture file describes no interface");
                    break;
                }
            }
        }

        log::debug!("capture file opened, link type {}", source.encap);

        Ok(source)
    }

    // Reads one block. A frame's bytes are left in `self.frame`.
    fn read_block(&mut self) -> Result<BlockEvent, Error> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let event = match block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            let resolution = if header.is_nanosecond_precision() {
                                NANOS_PER_SEC
                            } else {
                                MICROS_PER_SEC
                            };
                            self.interfaces.clear();
                            self.interfaces.push(Interface {
                                encap: header.network.0 as EncapType,
                                resolution,
                                offset: 0,
                            });
                            BlockEvent::Meta
                        }
                        PcapBlockOwned::Legacy(packet) => {
                            let interface = self.interfaces.first().ok_or_else(|| {
                                Error::Capture("pcap file header not found".to_string())
                            })?;
                            let timestamp = interface.timestamp(packet.ts_sec, packet.ts_usec);

                            // The block borrows the reader's buffer, which `consume` invalidates.
                            self.frame.clear();
                            self.frame.extend_from_slice(packet.data);
                            BlockEvent::Frame {
                                if_id: 0,
                                caplen: packet.caplen,
                                timestamp,
                            }
                        }
                        PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                            // Interface ids are local to a section.
                            self.interfaces.clear();
                            BlockEvent::Meta
                        }
                        PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                            self.interfaces.push(Interface {
                                encap: idb.linktype.0 as EncapType,
                                resolution: idb.ts_resolution().unwrap_or(MICROS_PER_SEC),
                                offset: idb.ts_offset() as u64,
                            });
                            BlockEvent::Meta
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                            let if_id = epb.if_id as usize;
                            let interface = self.interfaces.get(if_id).ok_or_else(|| {
                                Error::Capture(format!("packet for unknown interface {}", if_id))
                            })?;
                            let (secs, fraction) =
                                epb.decode_ts(interface.offset, interface.resolution);
                            let timestamp = interface.timestamp(secs, fraction);

                            self.frame.clear();
                            self.frame.extend_from_slice(epb.packet_data());
                            BlockEvent::Frame {
                                if_id,
                                caplen: epb.caplen,
                                timestamp,
                            }
                        }
                        PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                            self.frame.clear();
                            self.frame.extend_from_slice(spb.packet_data());
                            BlockEvent::Frame {
                                if_id: 0,
                                caplen: self.frame.len() as u32,
                                timestamp: Timestamp::default(),
                            }
                        }
                        _ => BlockEvent::Meta,
                    };
                    self.reader.consume(offset);

                    return Ok(event);
                }
                Err(PcapError::Eof) => return Ok(BlockEvent::Eof),
                Err(PcapError::Incomplete(_)) => self.refill()?,
                Err(PcapError::BufferTooSmall) => self.grow()?,
                Err(e) => return Err(Error::Capture(format!("pcap parse error: {:?}", e))),
            }
        }
    }

    fn refill(&mut self) -> Result<(), Error> {
        self.reader
            .refill()
            .map_err(|e| Error::Capture(format!("pcap refill: {:?}", e)))
    }

    fn grow(&mut self) -> Result<(), Error> {
        let size = self.buffer_size * 2;
        if size > MAX_BUFFER_SIZE || !self.reader.grow(size) {
            return Err(Error::Capture(format!(
                "capture block larger than {} bytes",
                self.buffer_size
            )));
        }
        log::debug!("capture reader buffer grown to {} bytes", size);
        self.buffer_size = size;

        Ok(())
    }
}

impl PacketSource for FileSource {
    fn encap_type(&self) -> EncapType {
        self.encap
    }

    fn next_packet(&mut self) -> Result<SourceEvent<'_>, Error> {
        loop {
            match self.read_block()? {
                BlockEvent::Frame {
                    if_id,
                    caplen,
                    timestamp,
                } => {
                    let encap = self.interfaces.get(if_id).map(|i| i.encap);
                    if encap != Some(self.encap) {
                        log::debug!(
                            "skipping frame of interface {} with link type {:?}",
                            if_id,
                            encap
                        );
                        continue;
                    }
                    return Ok(SourceEvent::Packet(CapturedPacket {
                        data: &self.frame,
                        caplen,
                        timestamp,
                    }));
                }
                BlockEvent::Meta => continue,
                BlockEvent::Eof => return Ok(SourceEvent::Eof),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pcap_file(network: u32, frames: &[(u32, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xa1b2_c3d4_u32.to_le_bytes());
        out.extend_from_slice(&2_u16.to_le_bytes());
        out.extend_from_slice(&4_u16.to_le_bytes());
        out.extend_from_slice(&0_i32.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes());
        out.extend_from_slice(&65535_u32.to_le_bytes());
        out.extend_from_slice(&network.to_le_bytes());
        for (ts, data) in frames {
            out.extend_from_slice(&ts.to_le_bytes());
            out.extend_from_slice(&250_u32.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(data);
        }
        out
    }

    fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
        let len = (12 + body.len()) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(&block_type.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(&len.to_le_bytes());
        out
    }

    // One section, interfaces with the given link types, microsecond timestamps.
    fn pcapng_file(links: &[u16], frames: &[(u32, u64, &[u8])]) -> Vec<u8> {
        let mut shb = Vec::new();
        shb.extend_from_slice(&0x1a2b_3c4d_u32.to_le_bytes());
        shb.extend_from_slice(&1_u16.to_le_bytes());
        shb.extend_from_slice(&0_u16.to_le_bytes());
        shb.extend_from_slice(&(-1_i64).to_le_bytes());
        let mut out = pcapng_block(0x0a0d_0d0a, &shb);

        for link in links {
            let mut idb = Vec::new();
            idb.extend_from_slice(&link.to_le_bytes());
            idb.extend_from_slice(&0_u16.to_le_bytes());
            idb.extend_from_slice(&0_u32.to_le_bytes());
            out.extend(pcapng_block(1, &idb));
        }

        for (if_id, ts, data) in frames {
            let mut epb = Vec::new();
            epb.extend_from_slice(&if_id.to_le_bytes());
            epb.extend_from_slice(&((ts >> 32) as u32).to_le_bytes());
            epb.extend_from_slice(&(*ts as u32).to_le_bytes());
            epb.extend_from_slice(&(data.len() as u32).to_le_bytes());
            epb.extend_from_slice(&(data.len() as u32).to_le_bytes());
            epb.extend_from_slice(data);
            epb.resize(epb.len() + (4 - data.len() % 4) % 4, 0);
            out.extend(pcapng_block(6, &epb));
        }
        out
    }

    #[test]
    fn reads_frames_in_order() {
        let bytes = pcap_file(1, &[(100, b"first"), (101, b"second frame")]);
        let mut source = FileSource::new(Cursor::new(bytes)).unwrap();
        assert_eq!(source.encap_type(), crate::types::ENCAP_TYPE_ETH);

        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => {
                assert_eq!(p.data, b"first");
                assert_eq!(p.caplen, 5);
                assert_eq!(p.timestamp, Timestamp::new(100, 250));
            }
            other => panic!("{:?}", other),
        }
        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => assert_eq!(p.data, b"second frame"),
            other => panic!("{:?}", other),
        }
        assert!(matches!(source.next_packet(), Ok(SourceEvent::Eof)));
    }

    #[test]
    fn reports_link_type() {
        let bytes = pcap_file(113, &[]);
        let source = FileSource::new(Cursor::new(bytes)).unwrap();

        assert_eq!(source.encap_type(), crate::types::ENCAP_TYPE_LINUX_SLL);
    }

    #[test]
    fn rejects_garbage() {
        let source = FileSource::new(Cursor::new(vec![0x42_u8; 64]));
        assert!(matches!(source, Err(Error::Capture(_))));
    }

    #[test]
    fn full_snaplen_frame() {
        let big = vec![0xab_u8; 65535];
        let bytes = pcap_file(1, &[(100, &big), (101, b"after")]);
        let mut source = FileSource::new(Cursor::new(bytes)).unwrap();

        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => {
                assert_eq!(p.data.len(), 65535);
                assert_eq!(p.caplen, 65535);
            }
            other => panic!("{:?}", other),
        }
        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => assert_eq!(p.data, b"after"),
            other => panic!("{:?}", other),
        }
        assert!(matches!(source.next_packet(), Ok(SourceEvent::Eof)));
    }

    #[test]
    fn frame_larger_than_buffer() {
        let big = vec![0xcd_u8; PCAP_BUFFER_SIZE + 1000];
        let bytes = pcap_file(1, &[(100, &big), (101, b"after")]);
        let mut source = FileSource::new(Cursor::new(bytes)).unwrap();

        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => assert_eq!(p.data.len(), big.len()),
            other => panic!("{:?}", other),
        }
        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => assert_eq!(p.data, b"after"),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn reads_pcapng() {
        let ts = 1_175_000_000_u64 * 1_000_000 + 42;
        let bytes = pcapng_file(&[1], &[(0, ts, b"GET /ng"), (0, ts + 1, b"frame")]);
        let mut source = FileSource::new(Cursor::new(bytes)).unwrap();
        assert_eq!(source.encap_type(), crate::types::ENCAP_TYPE_ETH);

        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => {
                assert_eq!(p.data, b"GET /ng");
                assert_eq!(p.caplen, 7);
                assert_eq!(p.timestamp, Timestamp::new(1_175_000_000, 42));
            }
            other => panic!("{:?}", other),
        }
        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => assert_eq!(p.data, b"frame"),
            other => panic!("{:?}", other),
        }
        assert!(matches!(source.next_packet(), Ok(SourceEvent::Eof)));
    }

    #[test]
    fn pcapng_skips_other_link_types() {
        let bytes = pcapng_file(&[1, 113], &[(1, 0, b"cooked"), (0, 0, b"ether")]);
        let mut source = FileSource::new(Cursor::new(bytes)).unwrap();

        match source.next_packet() {
            Ok(SourceEvent::Packet(p)) => assert_eq!(p.data, b"ether"),
            other => panic!("{:?}", other),
        }
        assert!(matches!(source.next_packet(), Ok(SourceEvent::Eof)));
    }
}
