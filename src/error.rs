//! Error types for OpenPGP parsing, encoding and encryption.

use thiserror::Error;

/// Result type alias for pgpcore operations.
pub type Result<T> = std::result::Result<T, PgpError>;

/// Main error type for pgpcore operations.
#[derive(Error, Debug)]
pub enum PgpError {
    /// A read ran past the end of the available bytes
    #[error("Unexpected end of input: needed {needed} bytes, {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Packet header, MPI length, S2K specifier or version marker is not well formed
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A packet body could not be parsed
    #[error("Malformed packet (tag {tag}): {reason}")]
    MalformedPacket { tag: u8, reason: String },

    /// An algorithm identifier that must be interpreted is not known
    #[error("Unsupported {kind} algorithm: {id}")]
    UnsupportedAlgorithm { kind: &'static str, id: u8 },

    /// The requested operation is not implemented
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// ASCII armor CRC24 verification failed
    #[error("Checksum mismatch: armor claims {expected:06X}, data hashes to {actual:06X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The crypto engine could not provide a primitive
    #[error("Crypto engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Armor encoding/decoding errors
    #[error("Armor error: {0}")]
    Armor(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configured parse limits were exceeded
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A packet-level failure inside a packet stream
    #[error("Parse error at byte offset {offset}: {source}")]
    Parse {
        offset: usize,
        #[source]
        source: Box<PgpError>,
    },
}

impl PgpError {
    /// Creates a new malformed header error.
    pub fn malformed_header<T: ToString>(msg: T) -> Self {
        Self::MalformedHeader(msg.to_string())
    }

    /// Creates a new malformed packet error for the given tag.
    pub fn malformed_packet<T: ToString>(tag: u8, reason: T) -> Self {
        Self::MalformedPacket {
            tag,
            reason: reason.to_string(),
        }
    }

    /// Creates a new unsupported algorithm error.
    pub fn unsupported_algorithm(kind: &'static str, id: u8) -> Self {
        Self::UnsupportedAlgorithm { kind, id }
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported_operation<T: ToString>(msg: T) -> Self {
        Self::UnsupportedOperation(msg.to_string())
    }

    /// Creates a new engine unavailable error.
    pub fn engine_unavailable<T: ToString>(msg: T) -> Self {
        Self::EngineUnavailable(msg.to_string())
    }

    /// Creates a new armor error.
    pub fn armor<T: ToString>(msg: T) -> Self {
        Self::Armor(msg.to_string())
    }

    /// Creates a new invalid input error.
    pub fn invalid_input<T: ToString>(msg: T) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    /// Creates a new validation error.
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Wraps this error with the stream offset it occurred at.
    ///
    /// Errors that already carry an offset are returned unchanged so the
    /// innermost position wins.
    pub fn at_offset(self, offset: usize) -> Self {
        match self {
            err @ Self::Parse { .. } => err,
            err => Self::Parse {
                offset,
                source: Box::new(err),
            },
        }
    }

    /// Byte offset for stream parse errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Parse { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// The underlying error, looking through any offset wrapper.
    pub fn root(&self) -> &PgpError {
        match self {
            Self::Parse { source, .. } => source.root(),
            err => err,
        }
    }
}
