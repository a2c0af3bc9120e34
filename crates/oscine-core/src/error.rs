//! Error types for Oscine

use thiserror::Error;

/// Result type alias for Oscine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Oscine error types
///
/// Codec errors abort decoding/encoding of the current packet only and carry
/// the byte offset at which the problem was found.
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough bytes left in the buffer for the requested field
    #[error("buffer underrun at offset {offset}: need {needed} bytes, have {have}")]
    BufferUnderrun {
        offset: usize,
        needed: usize,
        have: usize,
    },

    /// An aligned field was read from a cursor not on a 4-byte boundary
    #[error("misaligned field at offset {0}: fields start on 4-byte boundaries")]
    BadAlignment(usize),

    /// A string field with no NUL terminator before the buffer end,
    /// or string bytes that are not valid UTF-8
    #[error("malformed string at offset {0}")]
    MalformedString(usize),

    /// A blob whose declared length exceeds the remaining buffer
    #[error("blob at offset {offset} declares {len} bytes, only {have} remain")]
    TruncatedBlob {
        offset: usize,
        len: usize,
        have: usize,
    },

    /// A type-tag character this implementation does not understand
    #[error("unsupported argument type tag '{0}'")]
    UnsupportedArgumentType(char),

    /// A packet that starts with neither '/' nor the bundle literal
    #[error("unrecognized packet start byte 0x{0:02x}")]
    UnrecognizedPacketStart(u8),

    /// Invalid message address
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address pattern compilation error
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Serialized packet would exceed the transport's payload ceiling
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}
