//! One-pass signature packets (tag 4).

use crate::buffer::BufferWrite;
use crate::error::{PgpError, Result};
use crate::packet::{parse_whole, PacketType};
use crate::types::KeyId;

const TAG: u8 = PacketType::OnePassSignature as u8;

/// Announces a signature that follows the signed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnePassSignature {
    pub signature_type: u8,
    pub hash_algorithm: u8,
    pub public_key_algorithm: u8,
    pub key_id: KeyId,
    /// False when another one-pass signature packet follows and applies to
    /// the same data
    pub last: bool,
}

impl OnePassSignature {
    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        parse_whole(TAG, body, |input| {
            let version = input.read_byte()?;
            if version != 3 {
                return Err(PgpError::malformed_packet(
                    TAG,
                    format!("unsupported one-pass signature version {}", version),
                ));
            }
            let signature_type = input.read_byte()?;
            let hash_algorithm = input.read_byte()?;
            let public_key_algorithm = input.read_byte()?;
            let key_id = KeyId::new(input.read_array()?);
            let last = match input.read_byte()? {
                0 => false,
                1 => true,
                other => {
                    return Err(PgpError::malformed_packet(
                        TAG,
                        format!("nested flag must be 0 or 1, got {}", other),
                    ))
                }
            };
            Ok(Self {
                signature_type,
                hash_algorithm,
                public_key_algorithm,
                key_id,
                last,
            })
        })
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(13);
        out.write_byte(3);
        out.write_byte(self.signature_type);
        out.write_byte(self.hash_algorithm);
        out.write_byte(self.public_key_algorithm);
        out.write_bytes(self.key_id.as_bytes());
        out.write_byte(self.last as u8);
        out
    }
}
