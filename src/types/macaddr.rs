//! MAC Address Type
//!
//! A Type representing MAC Address as an array of `[u8; 6]`

use core::fmt;

use serde::{Serialize, Serializer};

use crate::errors::Error as CrateError;

#[derive(Default, Clone, PartialEq, Eq)]
pub struct MACAddress([u8; 6]);

impl Serialize for MACAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(format!("{}", self).as_str())
    }
}

impl From<[u8; 6]> for MACAddress {
    fn from(value: [u8; 6]) -> Self {
        Self(value)
    }
}

impl TryFrom<&'_ [u8]> for MACAddress {
    type Error = CrateError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let octets: [u8; 6] = slice
            .try_into()
            .map_err(|_| CrateError::ParseError(format!("MacAddress: {}", hex::encode(slice))))?;
        Ok(Self(octets))
    }
}

impl fmt::Display for MACAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Debug for MACAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_length_fails_with_hex_dump() {
        let mac_address: Result<MACAddress, _> = [00u8, 01u8, 02u8][..].try_into();
        match mac_address {
            Err(CrateError::ParseError(s)) => assert_eq!(s, "MacAddress: 000102"),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn display_is_colon_separated_lower_hex() {
        let mac: MACAddress = [0x00, 0xe0, 0x81, 0x00, 0xb0, 0x28].into();
        assert_eq!(mac.to_string(), "00:e0:81:00:b0:28");
    }
}
