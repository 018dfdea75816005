//! Linux Cooked Link Layer version 1

use serde::Serialize;

use crate::errors::Error;
use crate::layer::{ensure_len, Layer};
use crate::types::EtherType;

pub const LINUX_SLL_HEADER_LEN: usize = 16_usize;

#[derive(Debug, Default, Serialize)]
pub struct LinuxSll {
    packet_type: u16,
    ll_type: u16,
    ll_addr_len: u16,
    ll_addr: [u8; 8],
    protocol: EtherType,
}

impl LinuxSll {
    pub fn protocol(&self) -> EtherType {
        self.protocol
    }
}

impl Layer for LinuxSll {
    fn decode_bytes(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        ensure_len(bytes, LINUX_SLL_HEADER_LEN)?;

        self.packet_type = u16::from_be_bytes([bytes[0], bytes[1]]);
        self.ll_type = u16::from_be_bytes([bytes[2], bytes[3]]);
        self.ll_addr_len = u16::from_be_bytes([bytes[4], bytes[5]]);
        self.ll_addr.copy_from_slice(&bytes[6..14]);
        self.protocol = EtherType(u16::from_be_bytes([bytes[14], bytes[15]]));

        Ok(LINUX_SLL_HEADER_LEN)
    }

    fn name(&self) -> &'static str {
        "Linux SLL Version 1"
    }

    fn short_name(&self) -> &'static str {
        "linux_sll"
    }
}
