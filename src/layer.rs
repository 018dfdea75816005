//! 'Layer' trait
//!
//! [`Layer`] is implemented by every header dissector in [`layers`][`crate::layers`]. A layer
//! decodes its own header from the front of a byte slice and reports how many bytes it consumed,
//! the caller decides what to decode next from the fields of the layer.

use core::fmt::Debug;

use serde::Serialize;

use crate::errors::Error;

/// `Layer` Trait defines a header 'Layer' in a captured frame
pub trait Layer: Debug + Serialize {
    /// Main 'decoder' function.
    ///
    /// Returns the number of bytes consumed by this layer's header on success. A slice shorter
    /// than the header yields [TooShort][`crate::errors::Error::TooShort`], nothing is read past
    /// the end of `bytes`.
    fn decode_bytes(&mut self, bytes: &[u8]) -> Result<usize, Error>;

    /// Name for the given layer.
    fn name(&self) -> &'static str;

    /// Short name for the given layer.
    fn short_name(&self) -> &'static str;
}

/// Returns a `TooShort` error unless `bytes` holds at least `required` bytes.
pub(crate) fn ensure_len(bytes: &[u8], required: usize) -> Result<(), Error> {
    if bytes.len() < required {
        return Err(Error::TooShort {
            required,
            available: bytes.len(),
            data: hex::encode(bytes),
        });
    }
    Ok(())
}
