//! Ethernet Layer

use serde::Serialize;

use crate::errors::Error;
use crate::layer::{ensure_len, Layer};
use crate::types::{EtherType, MACAddress};

pub const ETH_HEADER_LENGTH: usize = 14_usize;

/// Structure representing the Ethernet Header of a Packet.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Ethernet {
    dst_mac: MACAddress,
    src_mac: MACAddress,
    ethertype: EtherType,
}

impl Ethernet {
    pub fn ethertype(&self) -> EtherType {
        self.ethertype
    }
}

impl Layer for Ethernet {
    fn decode_bytes(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        ensure_len(bytes, ETH_HEADER_LENGTH)?;

        self.dst_mac = bytes[0..6].try_into()?;
        self.src_mac = bytes[6..12].try_into()?;
        self.ethertype = EtherType((bytes[12] as u16) << 8 | bytes[13] as u16);

        Ok(ETH_HEADER_LENGTH)
    }

    fn name(&self) -> &'static str {
        "Ethernet"
    }

    fn short_name(&self) -> &'static str {
        "eth"
    }
}
