//! Packet sources
//!
//! A [`PacketSource`] hands out one captured frame at a time. The frame borrows from the source,
//! so the previous frame must be done with before the next one is requested. [`FileSource`] reads
//! pcap capture files without libpcap, `LibpcapSource` (feature `libpcap`) captures from live
//! interfaces and applies capture filters.

use crate::errors::Error;
use crate::packet::Timestamp;
use crate::types::EncapType;

mod file;
pub use file::FileSource;

cfg_libpcap! {
    mod live;
    pub use live::LibpcapSource;
}

/// One frame as delivered by the capture collaborator.
#[derive(Debug, Clone, Copy)]
pub struct CapturedPacket<'a> {
    /// Captured bytes, possibly fewer than were on the wire.
    pub data: &'a [u8],
    /// Number of bytes actually captured.
    pub caplen: u32,
    pub timestamp: Timestamp,
}

#[derive(Debug)]
pub enum SourceEvent<'a> {
    Packet(CapturedPacket<'a>),
    /// Nothing arrived within the read timeout.
    Timeout,
    /// No more packets will be delivered.
    Eof,
}

pub trait PacketSource {
    /// Link-layer encapsulation of every frame from this source.
    fn encap_type(&self) -> EncapType;

    fn next_packet(&mut self) -> Result<SourceEvent<'_>, Error>;
}
