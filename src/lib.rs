//! httpry: HTTP transaction logging from captured packets.
//!
//! Each captured frame goes through the same steps:
//!
//! 1. [`PacketDecoder`] strips the link, IPv4 and TCP headers and yields the TCP payload.
//! 2. [`HttpParser`] recognizes a `GET`/`HEAD` request or a response and splits out the start line
//!    and header lines.
//! 3. The extracted `(name, value)` pairs, together with the synthesized `Direction`,
//!    `Source-IP`, `Dest-IP` and `Timestamp` fields, are assigned into the [`FieldRegistry`],
//!    which only keeps the fields named in the format string.
//! 4. [`RecordEmitter`] writes the registry as one line and clears it for the next packet.
//!
//! Packets failing any step are dropped silently. [`Pipeline`] ties the steps together and drives
//! them from a [`PacketSource`].
//!
//! ```rust
//! use httpry::{FieldRegistry, PacketDecoder, Pipeline, RecordEmitter, RecordFormat};
//! use httpry::capture::CapturedPacket;
//! use httpry::packet::Timestamp;
//!
//! let mut frame = hex::decode("00e08100b02800096b88f5c90800450000c1d24940008006c85b0a000005cf2e865e0cc30050a80076877de014025018faf0ad620000").unwrap();
//! frame.extend_from_slice(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
//!
//! let registry = FieldRegistry::from_format_str("Method,Host,Request-URI").unwrap();
//! let emitter = RecordEmitter::new(Vec::new(), RecordFormat::Tsv);
//! let decoder = PacketDecoder::new(httpry::types::ENCAP_TYPE_ETH).unwrap();
//! let mut pipeline = Pipeline::new(decoder, registry, emitter);
//!
//! let packet = CapturedPacket {
//!     data: &frame,
//!     caplen: frame.len() as u32,
//!     timestamp: Timestamp::default(),
//! };
//! pipeline.process(&packet).unwrap();
//!
//! let out = pipeline.into_emitter().into_inner();
//! assert_eq!(out, b"GET\texample.com\t/index.html\n");
//! ```

#[macro_use]
mod cfg_macros;

pub mod errors;
pub use errors::Error;

pub mod layer;
pub use layer::Layer;

pub mod layers;

pub mod types;

pub mod packet;
pub use packet::{DecodedPacket, PacketDecoder};

pub mod capture;
pub use capture::{CapturedPacket, PacketSource};

pub mod format;
pub use format::FieldRegistry;

pub mod emitter;
pub use emitter::{RecordEmitter, RecordFormat};

pub mod rate;

pub mod config;
pub use config::Config;

pub mod pipeline;
pub use pipeline::{Pipeline, Verdict};

pub use layers::http::HttpParser;
