//! IPv4 Layer

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::errors::Error;
use crate::layer::{ensure_len, Layer};

/// Basic Length of the IPv4 Header when no options are present
pub const IPV4_BASE_HEADER_LENGTH: usize = 20_usize;

/// IANA Assigned protocol number for TCP
pub const IPPROTO_TCP: u8 = 6_u8;

#[derive(Debug, Serialize)]
pub struct IPv4 {
    version: u8,
    hdr_len: u8,
    tos: u8,
    len: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    id: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    frag_offset: u16,
    ttl: u8,
    proto: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    src_addr: Ipv4Addr,
    dst_addr: Ipv4Addr,
}

impl Default for IPv4 {
    fn default() -> Self {
        Self {
            version: 4,
            hdr_len: 5,
            tos: 0,
            len: 0,
            id: 0,
            flags: 0,
            frag_offset: 0,
            ttl: 0,
            proto: 0,
            checksum: 0,
            src_addr: Ipv4Addr::UNSPECIFIED,
            dst_addr: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl IPv4 {
    pub fn proto(&self) -> u8 {
        self.proto
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        self.src_addr
    }

    pub fn dst_addr(&self) -> Ipv4Addr {
        self.dst_addr
    }

    /// Header length in bytes, options included.
    pub fn header_len(&self) -> usize {
        self.hdr_len as usize * 4
    }
}

impl Layer for IPv4 {
    fn decode_bytes(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        ensure_len(bytes, IPV4_BASE_HEADER_LENGTH)?;

        self.version = bytes[0] >> 4;
        self.hdr_len = bytes[0] & 0x0f;
        if self.version != 4 {
            return Err(Error::ParseError(format!("IPv4 version: {}", self.version)));
        }
        // Length is in 4 octets
        if self.header_len() < IPV4_BASE_HEADER_LENGTH {
            return Err(Error::ParseError(format!("IPv4 IHL: {}", self.hdr_len)));
        }
        ensure_len(bytes, self.header_len())?;

        self.tos = bytes[1];
        self.len = u16::from_be_bytes([bytes[2], bytes[3]]);
        self.id = u16::from_be_bytes([bytes[4], bytes[5]]);
        let flags_offset = u16::from_be_bytes([bytes[6], bytes[7]]);
        self.flags = (flags_offset >> 13) as u8;
        self.frag_offset = flags_offset & 0x1fff;
        self.ttl = bytes[8];
        self.proto = bytes[9];
        self.checksum = u16::from_be_bytes([bytes[10], bytes[11]]);
        self.src_addr = Ipv4Addr::new(bytes[12], bytes[13], bytes[14], bytes[15]);
        self.dst_addr = Ipv4Addr::new(bytes[16], bytes[17], bytes[18], bytes[19]);

        // Options are skipped, nothing downstream looks at them.
        Ok(self.header_len())
    }

    fn name(&self) -> &'static str {
        "IPv4"
    }

    fn short_name(&self) -> &'static str {
        "ip"
    }
}
