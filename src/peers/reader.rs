/// Offset-tracking cursor that decodes Bitcoin consensus types from a byte slice.
use bitcoin::consensus::Decodable;
use bitcoin::consensus::encode;
use bitcoin::io;

use super::errors::PeersError;

/// A forward-only reader over an in-memory buffer.
///
/// Every read reports the field it was decoding so errors point at something
/// meaningful. A failed read leaves the cursor where it was.
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    rest: &'a [u8],
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, rest: data }
    }

    /// Current byte offset from the start of the buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.data.len() - self.rest.len()
    }

    /// Everything consumed so far.
    #[must_use]
    pub fn consumed(&self) -> &'a [u8] {
        &self.data[..self.position()]
    }

    /// Build a `Corrupt` error at the current offset.
    #[must_use]
    pub fn corrupt(&self, reason: impl Into<String>) -> PeersError {
        PeersError::Corrupt {
            offset: self.position(),
            reason: reason.into(),
        }
    }

    /// Decode the next value in consensus encoding.
    ///
    /// # Errors
    ///
    /// Returns `PeersError::Truncated` if the buffer ends mid-value, or
    /// `PeersError::Corrupt` if the bytes are not a valid encoding.
    pub fn decode<T: Decodable>(&mut self, context: &'static str) -> Result<T, PeersError> {
        let offset = self.position();
        let mut cursor = self.rest;
        let value = T::consensus_decode(&mut cursor).map_err(|err| match err {
            encode::Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                PeersError::Truncated { offset, context }
            }
            other => PeersError::Corrupt {
                offset,
                reason: format!("{context}: {other}"),
            },
        })?;
        self.rest = cursor;
        Ok(value)
    }

    /// Big-endian `u16` (network byte order, used for ports).
    ///
    /// # Errors
    ///
    /// Returns `PeersError::Truncated` if the buffer is too short.
    pub fn port(&mut self, context: &'static str) -> Result<u16, PeersError> {
        self.decode::<u16>(context).map(u16::swap_bytes)
    }
}
