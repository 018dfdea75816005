//! Link-layer and protocol number types shared by the dissectors

mod macaddr;
pub use macaddr::*;

mod ethertype;
pub use ethertype::*;

pub mod hex;

/// Packet Encapsulation Type
///
/// This value is same as the link-layer header types (`DLT_*`) used by [libpcap][libpcap] and
/// stored in the pcap file header.
///
/// [libpcap]: https://www.tcpdump.org/linktypes.html
pub type EncapType = u32;

pub const ENCAP_TYPE_ETH: EncapType = 1_u32;
pub const ENCAP_TYPE_LINUX_SLL: EncapType = 113_u32;
