//! Error types

use std::io;

#[derive(Debug)]
pub enum Error {
    /// A header needs more bytes than the captured slice holds.
    TooShort {
        required: usize,
        available: usize,
        data: String,
    },
    ParseError(String),
    /// IPv4 protocol field is something other than TCP.
    NotTcp(u8),
    UnsupportedEtherType(u16),
    /// Headers consume the whole capture.
    NoPayload,
    /// Payload does not start with a recognized request method or `HTTP/`.
    NotHttp,
    Malformed(&'static str),
    Config(String),
    UnsupportedEncap(u32),
    Capture(String),
    Io(io::Error),
}

impl Error {
    /// Packet level errors drop a single packet, everything else ends the run.
    pub fn is_packet_error(&self) -> bool {
        matches!(
            self,
            Error::TooShort { .. }
                | Error::ParseError(_)
                | Error::NotTcp(_)
                | Error::UnsupportedEtherType(_)
                | Error::NoPayload
                | Error::NotHttp
                | Error::Malformed(_)
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TooShort {
                required,
                available,
                data,
            } => write!(
                f,
                "too short: required {} bytes, available {}, data: {}",
                required, available, data
            ),
            Error::ParseError(s) => write!(f, "parse error: {}", s),
            Error::NotTcp(proto) => write!(f, "not a TCP packet (protocol {})", proto),
            Error::UnsupportedEtherType(t) => write!(f, "unsupported ethertype 0x{:04X}", t),
            Error::NoPayload => write!(f, "packet carries no payload"),
            Error::NotHttp => write!(f, "payload is not an HTTP message"),
            Error::Malformed(what) => write!(f, "malformed HTTP message: {}", what),
            Error::Config(s) => write!(f, "configuration error: {}", s),
            Error::UnsupportedEncap(encap) => {
                write!(f, "unsupported link-layer encapsulation: {}", encap)
            }
            Error::Capture(s) => write!(f, "capture error: {}", s),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
