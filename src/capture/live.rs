//! libpcap backed capture

use std::path::Path;

use pcap::{Activated, Capture, Device};

use crate::capture::{CapturedPacket, PacketSource, SourceEvent};
use crate::errors::Error;
use crate::packet::Timestamp;
use crate::types::EncapType;

const SNAPLEN: i32 = 65535;
/// Read timeout, bounds how long a shutdown request waits on an idle interface.
const READ_TIMEOUT_MS: i32 = 1000;

pub struct LibpcapSource {
    cap: Capture<dyn Activated>,
}

impl LibpcapSource {
    /// Capture from `interface`, or from the default device when `None`.
    pub fn live(interface: Option<&str>, promisc: bool, filter: &str) -> Result<Self, Error> {
        let device = match interface {
            Some(name) => Device::from(name),
            None => Device::lookup()
                .map_err(capture_error)?
                .ok_or_else(|| Error::Capture("cannot find a valid capture device".to_string()))?,
        };
        log::info!("capturing on '{}'", device.name);

        let cap = Capture::from_device(device)
            .map_err(capture_error)?
            .promisc(promisc)
            .snaplen(SNAPLEN)
            .timeout(READ_TIMEOUT_MS)
            .open()
            .map_err(capture_error)?;

        Self::with_filter(cap.into(), filter)
    }

    /// Read a capture file through libpcap, which allows a capture filter to be applied.
    pub fn offline<P: AsRef<Path>>(path: P, filter: &str) -> Result<Self, Error> {
        let cap = Capture::from_file(path).map_err(capture_error)?;

        Self::with_filter(cap.into(), filter)
    }

    fn with_filter(mut cap: Capture<dyn Activated>, filter: &str) -> Result<Self, Error> {
        if !filter.is_empty() {
            cap.filter(filter, true).map_err(|e| {
                Error::Config(format!("bad capture filter syntax in '{}': {}", filter, e))
            })?;
        }

        Ok(Self { cap })
    }
}

fn capture_error(e: pcap::Error) -> Error {
    Error::Capture(e.to_string())
}

impl PacketSource for LibpcapSource {
    fn encap_type(&self) -> EncapType {
        self.cap.get_datalink().0 as EncapType
    }

    fn next_packet(&mut self) -> Result<SourceEvent<'_>, Error> {
        match self.cap.next_packet() {
            Ok(packet) => Ok(SourceEvent::Packet(CapturedPacket {
                data: packet.data,
                caplen: packet.header.caplen,
                timestamp: Timestamp::new(
                    packet.header.ts.tv_sec as i64,
                    packet.header.ts.tv_usec as i64,
                ),
            })),
            Err(pcap::Error::TimeoutExpired) => Ok(SourceEvent::Timeout),
            Err(pcap::Error::NoMorePackets) => Ok(SourceEvent::Eof),
            Err(e) => Err(capture_error(e)),
        }
    }
}
