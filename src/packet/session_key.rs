//! Session key packets (tags 1 and 3).

use crate::buffer::{Buffer, BufferWrite};
use crate::crypto::{CryptoEngine, HashAlgorithm, SymmetricAlgorithm};
use crate::error::{PgpError, Result};
use crate::packet::{parse_whole, PacketType};
use crate::s2k::{S2k, DEFAULT_COUNT};
use crate::types::KeyId;

/// Public-key encrypted session key (tag 1), version 3.
///
/// The encrypted session key is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricSessionKey {
    /// Key id of the recipient key, or all zeros for a wildcard
    pub key_id: KeyId,
    /// Public-key algorithm id
    pub algorithm: u8,
    /// Algorithm-specific encrypted session key fields
    pub encrypted_key: Vec<u8>,
}

impl AsymmetricSessionKey {
    const TAG: u8 = PacketType::AsymmetricSessionKey as u8;

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        parse_whole(Self::TAG, body, |input| {
            let version = input.read_byte()?;
            if version != 3 {
                return Err(PgpError::malformed_packet(
                    Self::TAG,
                    format!("unsupported session key version {}", version),
                ));
            }
            Ok(Self {
                key_id: KeyId::new(input.read_array()?),
                algorithm: input.read_byte()?,
                encrypted_key: input.read_rest().to_vec(),
            })
        })
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10 + self.encrypted_key.len());
        out.write_byte(3);
        out.write_bytes(self.key_id.as_bytes());
        out.write_byte(self.algorithm);
        out.write_bytes(&self.encrypted_key);
        out
    }
}

/// Symmetric-key encrypted session key (tag 3), version 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricSessionKey {
    pub algorithm: SymmetricAlgorithm,
    pub s2k: S2k,
    /// Encrypted session key; empty when the S2K output is the session key
    pub encrypted_key: Vec<u8>,
}

impl SymmetricSessionKey {
    const TAG: u8 = PacketType::SymmetricSessionKey as u8;

    pub fn new(algorithm: SymmetricAlgorithm, s2k: S2k) -> Self {
        Self {
            algorithm,
            s2k,
            encrypted_key: Vec::new(),
        }
    }

    /// AES-128 with a fresh iterated and salted SHA-1 S2K.
    pub fn generate(engine: &dyn CryptoEngine) -> Result<Self> {
        Ok(Self::new(
            SymmetricAlgorithm::Aes128,
            S2k::iterated(engine, HashAlgorithm::Sha1, DEFAULT_COUNT)?,
        ))
    }

    pub fn version(&self) -> u8 {
        4
    }

    /// True when the S2K output is used directly as the session key.
    pub fn uses_s2k_key(&self) -> bool {
        self.encrypted_key.is_empty()
    }

    pub(crate) fn read(input: &mut Buffer<'_>) -> Result<Self> {
        let version = input.read_byte()?;
        if version != 4 {
            return Err(PgpError::malformed_packet(
                Self::TAG,
                format!("unsupported session key version {}", version),
            ));
        }
        let algorithm = SymmetricAlgorithm::try_from(input.read_byte()?)?;
        let s2k = input.read_s2k()?;
        Ok(Self {
            algorithm,
            s2k,
            encrypted_key: input.read_rest().to_vec(),
        })
    }

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        parse_whole(Self::TAG, body, Self::read)
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_byte(self.version());
        out.write_byte(self.algorithm.id());
        out.write_s2k(&self.s2k);
        out.write_bytes(&self.encrypted_key);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RustCryptoEngine;

    #[test]
    fn test_asymmetric_round_trip() {
        let body = [
            3, 0x96, 0x50, 0xfa, 0x47, 0xaf, 0xdc, 0xee, 0xdd, 1, 0x00, 0x08, 0xaa,
        ];
        let packet = AsymmetricSessionKey::from_bytes(&body).unwrap();
        assert_eq!(packet.key_id.to_hex(), "9650FA47AFDCEEDD");
        assert_eq!(packet.algorithm, 1);
        assert_eq!(packet.encrypted_key, vec![0x00, 0x08, 0xaa]);
        assert_eq!(packet.to_bytes(), body);

        let mut bad = body;
        bad[0] = 2;
        assert!(matches!(
            AsymmetricSessionKey::from_bytes(&bad),
            Err(PgpError::MalformedPacket { tag: 1, .. })
        ));
    }

    #[test]
    fn test_symmetric_defaults() {
        let engine = RustCryptoEngine::new();
        let packet = SymmetricSessionKey::generate(&engine).unwrap();
        assert_eq!(packet.version(), 4);
        assert_eq!(packet.algorithm, SymmetricAlgorithm::Aes128);
        assert_eq!(packet.s2k.mode(), 3);
        assert_eq!(packet.s2k.count(), Some(DEFAULT_COUNT));

        let body = packet.to_bytes();
        assert_eq!(body.len(), 13);
        assert_eq!(SymmetricSessionKey::from_bytes(&body).unwrap(), packet);
    }

    #[test]
    fn test_symmetric_with_encrypted_key() {
        let mut packet = SymmetricSessionKey::new(
            SymmetricAlgorithm::Cast5,
            S2k::salted_with(HashAlgorithm::Sha256, [9; 8]),
        );
        assert!(packet.uses_s2k_key());
        let bare = SymmetricSessionKey::from_bytes(&packet.to_bytes()).unwrap();
        assert_eq!(bare, packet);
        assert!(bare.uses_s2k_key());

        packet.encrypted_key = vec![1, 2, 3, 4];
        let body = packet.to_bytes();
        let parsed = SymmetricSessionKey::from_bytes(&body).unwrap();
        assert_eq!(parsed, packet);
        assert!(!parsed.uses_s2k_key());
    }

    #[test]
    fn test_symmetric_bad_version_and_cipher() {
        assert!(matches!(
            SymmetricSessionKey::from_bytes(&[5, 7, 0, 2]),
            Err(PgpError::MalformedPacket { tag: 3, .. })
        ));
        assert!(matches!(
            SymmetricSessionKey::from_bytes(&[4, 5, 0, 2]),
            Err(PgpError::UnsupportedAlgorithm { kind: "symmetric", id: 5 })
        ));
        assert!(matches!(
            SymmetricSessionKey::from_bytes(&[4, 7, 2, 2]),
            Err(PgpError::MalformedHeader(_))
        ));
    }
}
