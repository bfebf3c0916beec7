//! Signature packets (tag 2) and their subpackets (RFC 4880 §5.2).

use crate::buffer::{Buffer, BufferWrite};
use crate::crypto::{HashAlgorithm, PublicKeyAlgorithm};
use crate::error::{PgpError, Result};
use crate::packet::{parse_whole, read_mpis, PacketType};
use crate::types::{KeyId, Mpi};

const TAG: u8 = PacketType::Signature as u8;

/// Subpacket type: signature creation time
pub const SUBPACKET_CREATION_TIME: u8 = 2;

/// Subpacket type: issuer key id
pub const SUBPACKET_ISSUER: u8 = 16;

/// One signature subpacket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subpacket {
    /// Subpacket type, without the critical bit
    pub tag: u8,
    /// Whether an implementation must understand this subpacket
    pub critical: bool,
    pub data: Vec<u8>,
}

impl Subpacket {
    pub fn new(tag: u8, data: Vec<u8>) -> Self {
        Self {
            tag: tag & 0x7f,
            critical: false,
            data,
        }
    }

    /// Decodes a whole subpacket area.
    pub fn parse_all(area: &[u8]) -> Result<Vec<Self>> {
        let mut input = Buffer::new(area);
        let mut subpackets = Vec::new();
        while !input.is_empty() {
            let first = input.read_byte()? as usize;
            let len = match first {
                0..=191 => first,
                192..=254 => ((first - 192) << 8) + input.read_byte()? as usize + 192,
                _ => input.read_u32()? as usize,
            };
            if len == 0 {
                return Err(PgpError::malformed_packet(TAG, "empty signature subpacket"));
            }
            let kind = input.read_byte()?;
            subpackets.push(Self {
                tag: kind & 0x7f,
                critical: kind & 0x80 != 0,
                data: input.read_bytes(len - 1)?.to_vec(),
            });
        }
        Ok(subpackets)
    }

    /// Encodes subpackets back into an area.
    pub fn encode_all(subpackets: &[Self]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for subpacket in subpackets {
            let len = subpacket.data.len() + 1;
            if len < 192 {
                out.write_byte(len as u8);
            } else if len < 16_320 {
                let len = len - 192;
                out.write_byte(192 + (len >> 8) as u8);
                out.write_byte((len & 0xff) as u8);
            } else {
                out.write_byte(0xff);
                out.write_u32(u32::try_from(len).map_err(|_| {
                    PgpError::invalid_input(format!("Subpacket of {} bytes is too long", len))
                })?);
            }
            out.write_byte(subpacket.tag | if subpacket.critical { 0x80 } else { 0 });
            out.write_bytes(&subpacket.data);
        }
        Ok(out)
    }
}

/// Version-specific signature fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureFields {
    /// v3: creation time and issuer inline
    V3 { created: u32, issuer: KeyId },
    /// v4: raw hashed and unhashed subpacket areas
    V4 { hashed: Vec<u8>, unhashed: Vec<u8> },
}

/// A signature packet. The signature is kept, not verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Signature class (0x00 binary document, 0x13 positive certification, ...)
    pub signature_type: u8,
    pub public_key_algorithm: PublicKeyAlgorithm,
    /// Hash algorithm id, kept as-is so unknown digests still parse
    pub hash_algorithm: u8,
    pub fields: SignatureFields,
    /// Left 16 bits of the signed hash
    pub hash_prefix: [u8; 2],
    /// Algorithm-specific signature values (RSA: m^d; DSA: r, s)
    pub mpis: Vec<Mpi>,
}

impl Signature {
    pub fn version(&self) -> u8 {
        match self.fields {
            SignatureFields::V3 { .. } => 3,
            SignatureFields::V4 { .. } => 4,
        }
    }

    /// The hash algorithm, when it is one this crate knows.
    pub fn hash(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_id(self.hash_algorithm)
    }

    /// Decoded hashed subpackets; empty for v3 signatures.
    pub fn hashed_subpackets(&self) -> Result<Vec<Subpacket>> {
        match &self.fields {
            SignatureFields::V3 { .. } => Ok(Vec::new()),
            SignatureFields::V4 { hashed, .. } => Subpacket::parse_all(hashed),
        }
    }

    /// Decoded unhashed subpackets; empty for v3 signatures.
    pub fn unhashed_subpackets(&self) -> Result<Vec<Subpacket>> {
        match &self.fields {
            SignatureFields::V3 { .. } => Ok(Vec::new()),
            SignatureFields::V4 { unhashed, .. } => Subpacket::parse_all(unhashed),
        }
    }

    fn find_subpacket(&self, tag: u8) -> Result<Option<Subpacket>> {
        let found = self
            .hashed_subpackets()?
            .into_iter()
            .chain(self.unhashed_subpackets()?)
            .find(|sp| sp.tag == tag);
        Ok(found)
    }

    /// Issuer key id from the v3 field or the issuer subpacket.
    pub fn issuer(&self) -> Result<Option<KeyId>> {
        match &self.fields {
            SignatureFields::V3 { issuer, .. } => Ok(Some(*issuer)),
            SignatureFields::V4 { .. } => self
                .find_subpacket(SUBPACKET_ISSUER)?
                .map(|sp| {
                    let bytes: [u8; 8] = sp.data.as_slice().try_into().map_err(|_| {
                        PgpError::malformed_packet(TAG, "issuer subpacket is not 8 bytes")
                    })?;
                    Ok(KeyId::new(bytes))
                })
                .transpose(),
        }
    }

    /// Signature creation time from the v3 field or the creation time
    /// subpacket.
    pub fn created(&self) -> Result<Option<u32>> {
        match &self.fields {
            SignatureFields::V3 { created, .. } => Ok(Some(*created)),
            SignatureFields::V4 { .. } => self
                .find_subpacket(SUBPACKET_CREATION_TIME)?
                .map(|sp| Buffer::new(&sp.data).read_timestamp())
                .transpose(),
        }
    }

    pub(crate) fn read(input: &mut Buffer<'_>) -> Result<Self> {
        let version = input.read_byte()?;
        let (signature_type, public_key_algorithm, hash_algorithm, fields) = match version {
            3 => {
                let hashed_len = input.read_byte()?;
                if hashed_len != 5 {
                    return Err(PgpError::malformed_header(format!(
                        "v3 signature hashed length must be 5, got {}",
                        hashed_len
                    )));
                }
                let signature_type = input.read_byte()?;
                let created = input.read_timestamp()?;
                let issuer = KeyId::new(input.read_array()?);
                let pk = input.read_byte()?;
                let hash = input.read_byte()?;
                (signature_type, pk, hash, SignatureFields::V3 { created, issuer })
            }
            4 => {
                let signature_type = input.read_byte()?;
                let pk = input.read_byte()?;
                let hash = input.read_byte()?;
                let hashed_len = input.read_u16()? as usize;
                let hashed = input.read_bytes(hashed_len)?.to_vec();
                let unhashed_len = input.read_u16()? as usize;
                let unhashed = input.read_bytes(unhashed_len)?.to_vec();
                (signature_type, pk, hash, SignatureFields::V4 { hashed, unhashed })
            }
            other => {
                return Err(PgpError::malformed_header(format!(
                    "unsupported signature version {}",
                    other
                )))
            }
        };

        let public_key_algorithm = PublicKeyAlgorithm::try_from(public_key_algorithm)?;
        let count = public_key_algorithm.signature_mpis().ok_or_else(|| {
            PgpError::unsupported_algorithm("public-key", public_key_algorithm.id())
        })?;
        let hash_prefix = input.read_array()?;
        let mpis = read_mpis(input, TAG, count)?;

        Ok(Self {
            signature_type,
            public_key_algorithm,
            hash_algorithm,
            fields,
            hash_prefix,
            mpis,
        })
    }

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        parse_whole(TAG, body, Self::read)
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.write_byte(self.version());
        match &self.fields {
            SignatureFields::V3 { created, issuer } => {
                out.write_byte(5);
                out.write_byte(self.signature_type);
                out.write_timestamp(*created);
                out.write_bytes(issuer.as_bytes());
                out.write_byte(self.public_key_algorithm.id());
                out.write_byte(self.hash_algorithm);
            }
            SignatureFields::V4 { hashed, unhashed } => {
                out.write_byte(self.signature_type);
                out.write_byte(self.public_key_algorithm.id());
                out.write_byte(self.hash_algorithm);
                for area in [hashed, unhashed] {
                    let len = u16::try_from(area.len()).map_err(|_| {
                        PgpError::invalid_input(format!(
                            "Subpacket area of {} bytes is too long",
                            area.len()
                        ))
                    })?;
                    out.write_u16(len);
                    out.write_bytes(area);
                }
            }
        }
        out.write_bytes(&self.hash_prefix);
        for mpi in &self.mpis {
            out.write_mpi(mpi)?;
        }
        Ok(out)
    }
}
