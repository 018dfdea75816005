//! Header dissectors
//!
//! Link layer ([`ethernet`], [`linux_sll`]), network layer ([`ipv4`]) and transport layer
//! ([`tcp`]) headers implement [`Layer`][`crate::layer::Layer`] and are stacked by the
//! [`PacketDecoder`][`crate::packet::PacketDecoder`]. [`http`] parses the application payload
//! found after them.

pub mod ethernet;
pub mod http;
pub mod ipv4;
pub mod linux_sll;
pub mod tcp;
