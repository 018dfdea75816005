//! TCP Layer

use serde::Serialize;

use crate::errors::Error;
use crate::layer::{ensure_len, Layer};

/// TCP header length
pub const TCP_BASE_HDR_LEN: usize = 20_usize;

#[derive(Debug, Default, Serialize)]
pub struct TCP {
    src_port: u16,
    dst_port: u16,
    seq_no: u32,
    ack_no: u32,
    data_offset: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    flags: u16,
    window_size: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    urgent_ptr: u16,
}

impl TCP {
    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    /// Header length in bytes as declared by the data offset field.
    pub fn header_len(&self) -> usize {
        self.data_offset as usize * 4
    }
}

impl Layer for TCP {
    fn decode_bytes(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        ensure_len(bytes, TCP_BASE_HDR_LEN)?;

        self.src_port = (bytes[0] as u16) << 8 | (bytes[1] as u16);
        self.dst_port = (bytes[2] as u16) << 8 | (bytes[3] as u16);
        self.seq_no = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        self.ack_no = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        self.data_offset = bytes[12] >> 4;
        self.flags = ((bytes[12] as u16) << 8 | (bytes[13] as u16)) & 0x01FF;
        self.window_size = (bytes[14] as u16) << 8 | (bytes[15] as u16);
        self.checksum = (bytes[16] as u16) << 8 | (bytes[17] as u16);
        self.urgent_ptr = (bytes[18] as u16) << 8 | (bytes[19] as u16);

        if self.header_len() < TCP_BASE_HDR_LEN {
            return Err(Error::ParseError(format!(
                "TCP data offset: {}",
                self.data_offset
            )));
        }

        // The declared length may run past the capture, the decoder compares it against
        // the captured length before slicing out the payload.
        Ok(self.header_len())
    }

    fn name(&self) -> &'static str {
        "TCP"
    }

    fn short_name(&self) -> &'static str {
        "tcp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_tcp_header() {
        let bytes = hex::decode("0cc30050a80076877de014025018faf0ad620000").unwrap();
        let mut tcp = TCP::default();

        let consumed = tcp.decode_bytes(&bytes);
        assert!(consumed.is_ok(), "{:?}", consumed.err());
        assert_eq!(consumed.unwrap(), TCP_BASE_HDR_LEN);
        assert_eq!(tcp.src_port(), 3267);
        assert_eq!(tcp.dst_port(), 80);
        assert_eq!(tcp.flags, 0x018);
    }

    #[test]
    fn decode_tcp_reports_declared_header_len() {
        // data offset of 8 words: 12 bytes of options follow the base header
        let bytes = hex::decode("0cc30050a80076877de014028018faf0ad620000").unwrap();
        let mut tcp = TCP::default();

        assert_eq!(tcp.decode_bytes(&bytes).unwrap(), 32);
    }

    #[test]
    fn decode_tcp_rejects_small_data_offset() {
        let bytes = hex::decode("0cc30050a80076877de014021018faf0ad620000").unwrap();
        let mut tcp = TCP::default();

        let result = tcp.decode_bytes(&bytes);
        assert!(matches!(result, Err(Error::ParseError(_))), "{:?}", result);
    }
}
