//! Encoding of whole exported documents.
//!
//! The access layer never encrypts anything itself. A [`DocumentCipher`]
//! supplied by the host turns the serialized document into opaque text and
//! back; [`Passthrough`] is the identity encoding.

use crate::error::Result;

/// Encodes and decodes serialized documents.
pub trait DocumentCipher {
    /// Encodes the serialized document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be encoded.
    fn encode(&self, plain: &str) -> Result<String>;

    /// Decodes text produced by [`DocumentCipher::encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be decoded.
    fn decode(&self, encoded: &str) -> Result<String>;
}

/// Identity encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl DocumentCipher for Passthrough {
    fn encode(&self, plain: &str) -> Result<String> {
        Ok(plain.to_string())
    }

    fn decode(&self, encoded: &str) -> Result<String> {
        Ok(encoded.to_string())
    }
}
