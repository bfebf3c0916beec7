//! Packets whose bodies are kept mostly or entirely opaque.

use crate::buffer::BufferWrite;
use crate::crypto::CompressionAlgorithm;
use crate::error::{PgpError, Result};
use crate::packet::{parse_whole, PacketType};

macro_rules! opaque_packet {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            pub data: Vec<u8>,
        }

        impl $name {
            pub fn new(data: impl Into<Vec<u8>>) -> Self {
                Self { data: data.into() }
            }

            /// Parse from packet body bytes
            pub fn from_bytes(body: &[u8]) -> Result<Self> {
                Ok(Self::new(body))
            }

            /// Serialize to packet body bytes
            pub fn to_bytes(&self) -> Vec<u8> {
                self.data.clone()
            }
        }
    };
}

opaque_packet!(
    /// Symmetrically encrypted data (tag 9): OpenPGP-CFB ciphertext.
    EncryptedData
);

opaque_packet!(
    /// Trust packet (tag 12), keyring-implementation specific.
    Trust
);

opaque_packet!(
    /// User attribute packet (tag 17), such as an embedded photo.
    UserAttribute
);

opaque_packet!(
    /// Modification detection code (tag 19): a SHA-1 over the plaintext.
    ModificationDetectionCode
);

/// Compressed data (tag 8). The compressed stream is not inflated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    /// Compression algorithm id
    pub algorithm: u8,
    pub data: Vec<u8>,
}

impl CompressedData {
    const TAG: u8 = PacketType::CompressedData as u8;

    /// The compression algorithm, when it is a known one.
    pub fn compression(&self) -> Option<CompressionAlgorithm> {
        CompressionAlgorithm::from_id(self.algorithm)
    }

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        parse_whole(Self::TAG, body, |input| {
            Ok(Self {
                algorithm: input.read_byte()?,
                data: input.read_rest().to_vec(),
            })
        })
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.data.len());
        out.write_byte(self.algorithm);
        out.write_bytes(&self.data);
        out
    }
}

/// Marker packet (tag 10). Its body is always `PGP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Marker;

impl Marker {
    const TAG: u8 = PacketType::Marker as u8;
    const BODY: &'static [u8] = b"PGP";

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        if body != Self::BODY {
            return Err(PgpError::malformed_packet(
                Self::TAG,
                format!("marker body must be \"PGP\", got {:02x?}", body),
            ));
        }
        Ok(Self)
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        Self::BODY.to_vec()
    }
}

/// Symmetrically encrypted and integrity protected data (tag 18), version 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntegrityProtectedData {
    /// Ciphertext, including the encrypted MDC packet
    pub data: Vec<u8>,
}

impl IntegrityProtectedData {
    const TAG: u8 = PacketType::IntegrityProtectedData as u8;

    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn version(&self) -> u8 {
        1
    }

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        parse_whole(Self::TAG, body, |input| {
            let version = input.read_byte()?;
            if version != 1 {
                return Err(PgpError::malformed_packet(
                    Self::TAG,
                    format!("unsupported integrity protected data version {}", version),
                ));
            }
            Ok(Self::new(input.read_rest()))
        })
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.data.len());
        out.write_byte(self.version());
        out.write_bytes(&self.data);
        out
    }
}

/// A packet with an unassigned or private/experimental tag (60-63).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    pub tag: u8,
    pub data: Vec<u8>,
}

impl Opaque {
    pub fn new(tag: u8, data: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            data: data.into(),
        }
    }

    /// Body size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
