//! Packet decoding
//!
//! [`PacketDecoder`] strips the link, IPv4 and TCP headers off a captured frame and hands out the
//! TCP payload together with the addressing and timing metadata of the packet.

use std::net::Ipv4Addr;

use chrono::TimeZone;

use crate::capture::CapturedPacket;
use crate::errors::Error;
use crate::layer::Layer;
use crate::layers::ethernet::Ethernet;
use crate::layers::http::MAX_PAYLOAD_LEN;
use crate::layers::ipv4::{IPv4, IPPROTO_TCP};
use crate::layers::linux_sll::LinuxSll;
use crate::layers::tcp::TCP;
use crate::types::{EncapType, EtherType, ENCAP_TYPE_ETH, ENCAP_TYPE_LINUX_SLL, ETHERTYPE_IP};

/// `strftime` style format of the `Timestamp` field.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Capture wall-clock time of a packet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub secs: i64,
    pub usecs: i64,
}

impl Timestamp {
    pub fn new(secs: i64, usecs: i64) -> Self {
        Self { secs, usecs }
    }

    /// Local time rendering used for the `Timestamp` field, `None` if the seconds do not map to
    /// a single local time.
    pub fn to_local_string(&self) -> Option<String> {
        chrono::Local
            .timestamp_opt(self.secs, 0)
            .single()
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
    }
}

/// A TCP segment with a non-empty payload, borrowing from the capture buffer.
#[derive(Debug)]
pub struct DecodedPacket<'a> {
    pub payload: &'a [u8],
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub timestamp: Timestamp,
}

impl DecodedPacket<'_> {
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

#[derive(Debug, Clone, Copy)]
enum LinkLayer {
    Ethernet,
    LinuxSll,
}

#[derive(Debug, Clone, Copy)]
pub struct PacketDecoder {
    link: LinkLayer,
}

impl PacketDecoder {
    /// Decoder for frames of the given encapsulation.
    pub fn new(encap: EncapType) -> Result<Self, Error> {
        let link = match encap {
            ENCAP_TYPE_ETH => LinkLayer::Ethernet,
            ENCAP_TYPE_LINUX_SLL => LinkLayer::LinuxSll,
            other => return Err(Error::UnsupportedEncap(other)),
        };

        Ok(Self { link })
    }

    /// Locate the TCP payload of a captured frame.
    ///
    /// Only the first `caplen` bytes are looked at. The payload handed out is clamped to
    /// [`MAX_PAYLOAD_LEN`], excess bytes are ignored.
    pub fn decode<'a>(&self, packet: &CapturedPacket<'a>) -> Result<DecodedPacket<'a>, Error> {
        let caplen = (packet.caplen as usize).min(packet.data.len());
        let bytes = &packet.data[..caplen];

        let (link_len, ethertype) = self.decode_link(bytes)?;
        if ethertype != ETHERTYPE_IP {
            return Err(Error::UnsupportedEtherType(ethertype.0));
        }

        let mut ipv4 = IPv4::default();
        let ip_len = ipv4.decode_bytes(&bytes[link_len..])?;
        trace_layer(&ipv4);
        if ipv4.proto() != IPPROTO_TCP {
            return Err(Error::NotTcp(ipv4.proto()));
        }

        let mut tcp = TCP::default();
        let tcp_len = tcp.decode_bytes(&bytes[link_len + ip_len..])?;
        trace_layer(&tcp);

        let headers_len = link_len + ip_len + tcp_len;
        if headers_len > caplen {
            return Err(Error::TooShort {
                required: headers_len,
                available: caplen,
                data: hex::encode(bytes),
            });
        }
        if headers_len == caplen {
            return Err(Error::NoPayload);
        }

        let end = caplen.min(headers_len + MAX_PAYLOAD_LEN);

        Ok(DecodedPacket {
            payload: &bytes[headers_len..end],
            src_addr: ipv4.src_addr(),
            dst_addr: ipv4.dst_addr(),
            src_port: tcp.src_port(),
            dst_port: tcp.dst_port(),
            timestamp: packet.timestamp,
        })
    }

    fn decode_link(&self, bytes: &[u8]) -> Result<(usize, EtherType), Error> {
        match self.link {
            LinkLayer::Ethernet => {
                let mut eth = Ethernet::default();
                let consumed = eth.decode_bytes(bytes)?;
                trace_layer(&eth);
                Ok((consumed, eth.ethertype()))
            }
            LinkLayer::LinuxSll => {
                let mut sll = LinuxSll::default();
                let consumed = sll.decode_bytes(bytes)?;
                trace_layer(&sll);
                Ok((consumed, sll.protocol()))
            }
        }
    }
}

fn trace_layer<L: Layer>(layer: &L) {
    if log::log_enabled!(log::Level::Trace) {
        match serde_json::to_string(layer) {
            Ok(json) => log::trace!("{}: {}", layer.short_name(), json),
            Err(e) => log::trace!("{}: {}", layer.name(), e),
        }
    }
}
