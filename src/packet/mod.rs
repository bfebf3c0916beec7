//! OpenPGP packet framing and the packet variants (RFC 4880 §4, §5).
//!
//! A [`Packet`] is one of a closed set of variants chosen by its tag. Tags
//! without a dedicated variant, including the private/experimental range
//! 60-63, become [`Packet::Experimental`] and keep their body bytes.

use std::fmt;

use tracing::debug;

use crate::buffer::Buffer;
use crate::error::{PgpError, Result};
use crate::types::Mpi;
use crate::validation::Limits;

pub mod data;
pub mod header;
pub mod key;
pub mod literal;
pub mod one_pass;
pub mod session_key;
pub mod signature;
pub mod user_id;

pub use data::{
    CompressedData, EncryptedData, IntegrityProtectedData, Marker, ModificationDetectionCode,
    Opaque, Trust, UserAttribute,
};
pub use header::{BodyLength, HeaderFormat, PacketHeader};
pub use key::{PublicKey, SecretKey};
pub use literal::{LiteralData, LiteralFormat};
pub use one_pass::OnePassSignature;
pub use session_key::{AsymmetricSessionKey, SymmetricSessionKey};
pub use signature::{Signature, SignatureFields, Subpacket};
pub use user_id::UserId;

/// PGP packet types defined in RFC 4880
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Public-Key Encrypted Session Key Packet
    AsymmetricSessionKey = 1,
    /// Signature Packet
    Signature = 2,
    /// Symmetric-Key Encrypted Session Key Packet
    SymmetricSessionKey = 3,
    /// One-Pass Signature Packet
    OnePassSignature = 4,
    /// Secret-Key Packet
    SecretKey = 5,
    /// Public-Key Packet
    PublicKey = 6,
    /// Secret-Subkey Packet
    SecretSubkey = 7,
    /// Compressed Data Packet
    CompressedData = 8,
    /// Symmetrically Encrypted Data Packet
    EncryptedData = 9,
    /// Marker Packet
    Marker = 10,
    /// Literal Data Packet
    LiteralData = 11,
    /// Trust Packet
    Trust = 12,
    /// User ID Packet
    UserId = 13,
    /// Public-Subkey Packet
    PublicSubkey = 14,
    /// User Attribute Packet
    UserAttribute = 17,
    /// Sym. Encrypted and Integrity Protected Data Packet
    IntegrityProtectedData = 18,
    /// Modification Detection Code Packet
    ModificationDetectionCode = 19,
}

impl PacketType {
    /// Convert packet type to byte value
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Convert byte value to packet type
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::AsymmetricSessionKey),
            2 => Some(Self::Signature),
            3 => Some(Self::SymmetricSessionKey),
            4 => Some(Self::OnePassSignature),
            5 => Some(Self::SecretKey),
            6 => Some(Self::PublicKey),
            7 => Some(Self::SecretSubkey),
            8 => Some(Self::CompressedData),
            9 => Some(Self::EncryptedData),
            10 => Some(Self::Marker),
            11 => Some(Self::LiteralData),
            12 => Some(Self::Trust),
            13 => Some(Self::UserId),
            14 => Some(Self::PublicSubkey),
            17 => Some(Self::UserAttribute),
            18 => Some(Self::IntegrityProtectedData),
            19 => Some(Self::ModificationDetectionCode),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AsymmetricSessionKey => "AsymmetricSessionKey",
            Self::Signature => "Signature",
            Self::SymmetricSessionKey => "SymmetricSessionKey",
            Self::OnePassSignature => "OnePassSignature",
            Self::SecretKey => "SecretKey",
            Self::PublicKey => "PublicKey",
            Self::SecretSubkey => "SecretSubkey",
            Self::CompressedData => "CompressedData",
            Self::EncryptedData => "EncryptedData",
            Self::Marker => "Marker",
            Self::LiteralData => "LiteralData",
            Self::Trust => "Trust",
            Self::UserId => "UserID",
            Self::PublicSubkey => "PublicSubkey",
            Self::UserAttribute => "UserAttribute",
            Self::IntegrityProtectedData => "IntegrityProtectedData",
            Self::ModificationDetectionCode => "ModificationDetectionCode",
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fails unless the body cursor has been fully consumed.
pub(crate) fn finish(input: &Buffer<'_>, tag: u8) -> Result<()> {
    if !input.is_empty() {
        return Err(PgpError::malformed_packet(
            tag,
            format!("{} trailing bytes after packet body", input.remaining()),
        ));
    }
    Ok(())
}

/// Reads `count` MPIs, reporting an inconsistent bit count against `tag`.
pub(crate) fn read_mpis(input: &mut Buffer<'_>, tag: u8, count: usize) -> Result<Vec<Mpi>> {
    (0..count)
        .map(|_| {
            input.read_mpi().map_err(|e| match e {
                PgpError::MalformedHeader(reason) => PgpError::malformed_packet(tag, reason),
                other => other,
            })
        })
        .collect()
}

/// Runs `read` over `body` and requires it to consume every byte.
pub(crate) fn parse_whole<'a, T>(
    tag: u8,
    body: &'a [u8],
    read: impl FnOnce(&mut Buffer<'a>) -> Result<T>,
) -> Result<T> {
    let mut input = Buffer::new(body);
    let value = read(&mut input)?;
    finish(&input, tag)?;
    Ok(value)
}

/// A parsed OpenPGP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    AsymmetricSessionKey(AsymmetricSessionKey),
    Signature(Signature),
    SymmetricSessionKey(SymmetricSessionKey),
    OnePassSignature(OnePassSignature),
    SecretKey(SecretKey),
    PublicKey(PublicKey),
    SecretSubkey(SecretKey),
    CompressedData(CompressedData),
    EncryptedData(EncryptedData),
    Marker(Marker),
    LiteralData(LiteralData),
    Trust(Trust),
    UserId(UserId),
    PublicSubkey(PublicKey),
    UserAttribute(UserAttribute),
    IntegrityProtectedData(IntegrityProtectedData),
    ModificationDetectionCode(ModificationDetectionCode),
    /// Unknown or private/experimental tag, body kept verbatim
    Experimental(Opaque),
}

impl Packet {
    /// The wire tag. Fixed per variant except for [`Packet::Experimental`].
    pub fn tag(&self) -> u8 {
        match self {
            Self::Experimental(opaque) => opaque.tag,
            other => other.packet_type().map_or(0, PacketType::to_byte),
        }
    }

    /// The packet type; `None` for experimental packets.
    pub fn packet_type(&self) -> Option<PacketType> {
        Some(match self {
            Self::AsymmetricSessionKey(_) => PacketType::AsymmetricSessionKey,
            Self::Signature(_) => PacketType::Signature,
            Self::SymmetricSessionKey(_) => PacketType::SymmetricSessionKey,
            Self::OnePassSignature(_) => PacketType::OnePassSignature,
            Self::SecretKey(_) => PacketType::SecretKey,
            Self::PublicKey(_) => PacketType::PublicKey,
            Self::SecretSubkey(_) => PacketType::SecretSubkey,
            Self::CompressedData(_) => PacketType::CompressedData,
            Self::EncryptedData(_) => PacketType::EncryptedData,
            Self::Marker(_) => PacketType::Marker,
            Self::LiteralData(_) => PacketType::LiteralData,
            Self::Trust(_) => PacketType::Trust,
            Self::UserId(_) => PacketType::UserId,
            Self::PublicSubkey(_) => PacketType::PublicSubkey,
            Self::UserAttribute(_) => PacketType::UserAttribute,
            Self::IntegrityProtectedData(_) => PacketType::IntegrityProtectedData,
            Self::ModificationDetectionCode(_) => PacketType::ModificationDetectionCode,
            Self::Experimental(_) => return None,
        })
    }

    /// Parses a packet body for `tag`.
    pub fn from_body(tag: u8, body: &[u8]) -> Result<Self> {
        let Some(packet_type) = PacketType::from_byte(tag) else {
            return Ok(Self::Experimental(Opaque::new(tag, body)));
        };
        Ok(match packet_type {
            PacketType::AsymmetricSessionKey => {
                Self::AsymmetricSessionKey(AsymmetricSessionKey::from_bytes(body)?)
            }
            PacketType::Signature => Self::Signature(Signature::from_bytes(body)?),
            PacketType::SymmetricSessionKey => {
                Self::SymmetricSessionKey(SymmetricSessionKey::from_bytes(body)?)
            }
            PacketType::OnePassSignature => {
                Self::OnePassSignature(OnePassSignature::from_bytes(body)?)
            }
            PacketType::SecretKey => Self::SecretKey(SecretKey::from_bytes(body)?),
            PacketType::PublicKey => Self::PublicKey(PublicKey::from_bytes(body)?),
            PacketType::SecretSubkey => Self::SecretSubkey(SecretKey::from_bytes(body)?),
            PacketType::CompressedData => Self::CompressedData(CompressedData::from_bytes(body)?),
            PacketType::EncryptedData => Self::EncryptedData(EncryptedData::from_bytes(body)?),
            PacketType::Marker => Self::Marker(Marker::from_bytes(body)?),
            PacketType::LiteralData => Self::LiteralData(LiteralData::from_bytes(body)?),
            PacketType::Trust => Self::Trust(Trust::from_bytes(body)?),
            PacketType::UserId => Self::UserId(UserId::from_bytes(body)?),
            PacketType::PublicSubkey => Self::PublicSubkey(parse_whole(tag, body, |input| {
                PublicKey::read(input, tag)
            })?),
            PacketType::UserAttribute => Self::UserAttribute(UserAttribute::from_bytes(body)?),
            PacketType::IntegrityProtectedData => {
                Self::IntegrityProtectedData(IntegrityProtectedData::from_bytes(body)?)
            }
            PacketType::ModificationDetectionCode => {
                Self::ModificationDetectionCode(ModificationDetectionCode::from_bytes(body)?)
            }
        })
    }

    /// Reads one framed packet from `input`.
    pub fn read(input: &mut Buffer<'_>, limits: &Limits) -> Result<Self> {
        let header = PacketHeader::parse(input)?;
        let body = header.read_body(input, limits)?;
        debug!(
            tag = header.tag,
            len = body.len(),
            format = %header.format,
            "parsed packet header"
        );
        Self::from_body(header.tag, &body)
    }

    /// Parses exactly one framed packet.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut input = Buffer::new(data);
        let packet = Self::read(&mut input, &Limits::default())?;
        if !input.is_empty() {
            return Err(PgpError::invalid_input(format!(
                "{} bytes after the packet",
                input.remaining()
            )));
        }
        Ok(packet)
    }

    /// Serializes the packet body, without a header.
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Self::AsymmetricSessionKey(p) => p.to_bytes(),
            Self::Signature(p) => p.to_bytes()?,
            Self::SymmetricSessionKey(p) => p.to_bytes(),
            Self::OnePassSignature(p) => p.to_bytes(),
            Self::SecretKey(p) | Self::SecretSubkey(p) => p.to_bytes()?,
            Self::PublicKey(p) | Self::PublicSubkey(p) => p.to_bytes()?,
            Self::CompressedData(p) => p.to_bytes(),
            Self::EncryptedData(p) => p.to_bytes(),
            Self::Marker(p) => p.to_bytes(),
            Self::LiteralData(p) => p.to_bytes()?,
            Self::Trust(p) => p.to_bytes(),
            Self::UserId(p) => p.to_bytes(),
            Self::UserAttribute(p) => p.to_bytes(),
            Self::IntegrityProtectedData(p) => p.to_bytes(),
            Self::ModificationDetectionCode(p) => p.to_bytes(),
            Self::Experimental(p) => p.data.clone(),
        })
    }

    /// Serializes the packet with a new-format header.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = self.body_bytes()?;
        let mut bytes = PacketHeader::new(self.tag(), body.len()).to_bytes()?;
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Serializes the packet with an old-format header (tags below 16 only).
    pub fn to_bytes_old_format(&self) -> Result<Vec<u8>> {
        let body = self.body_bytes()?;
        let mut bytes = PacketHeader::old_format(self.tag(), body.len()).to_bytes()?;
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Key material for key and subkey packets, public or secret.
    pub fn public_key(&self) -> Option<&PublicKey> {
        match self {
            Self::PublicKey(key) | Self::PublicSubkey(key) => Some(key),
            Self::SecretKey(key) | Self::SecretSubkey(key) => Some(key.public()),
            _ => None,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.packet_type() {
            Some(packet_type) => write!(f, "{}", packet_type)?,
            None => write!(f, "Experimental({})", self.tag())?,
        }
        match self {
            Self::PublicKey(key) | Self::PublicSubkey(key) => write!(
                f,
                ": v{} {} {} bits, created {}",
                key.version(),
                key.algorithm(),
                key.bits(),
                key.created()
            ),
            Self::SecretKey(key) | Self::SecretSubkey(key) => {
                let key = key.public();
                write!(f, ": v{} {} {} bits", key.version(), key.algorithm(), key.bits())
            }
            Self::Signature(sig) => write!(
                f,
                ": v{} class {:#04x}, {} hash {}",
                sig.version(),
                sig.signature_type,
                sig.public_key_algorithm,
                sig.hash().map_or_else(|| sig.hash_algorithm.to_string(), |h| h.to_string())
            ),
            Self::UserId(uid) => write!(f, ": {}", uid),
            Self::LiteralData(lit) => write!(
                f,
                ": format {}, {:?}, {} bytes",
                lit.format,
                lit.filename_lossy(),
                lit.data.len()
            ),
            Self::SymmetricSessionKey(skesk) => {
                write!(f, ": {}, S2K mode {}", skesk.algorithm, skesk.s2k.mode())
            }
            Self::AsymmetricSessionKey(pkesk) => write!(f, ": key id {}", pkesk.key_id),
            Self::OnePassSignature(ops) => write!(f, ": key id {}", ops.key_id),
            Self::EncryptedData(p) => write!(f, ": {} bytes", p.data.len()),
            Self::IntegrityProtectedData(p) => write!(f, ": {} bytes", p.data.len()),
            Self::CompressedData(p) => write!(f, ": algorithm {}", p.algorithm),
            Self::Experimental(p) => write!(f, ": {} bytes", p.len()),
            _ => Ok(()),
        }
    }
}

macro_rules! packet_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Packet {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

packet_from!(
    AsymmetricSessionKey(AsymmetricSessionKey),
    Signature(Signature),
    SymmetricSessionKey(SymmetricSessionKey),
    OnePassSignature(OnePassSignature),
    CompressedData(CompressedData),
    EncryptedData(EncryptedData),
    Marker(Marker),
    LiteralData(LiteralData),
    Trust(Trust),
    UserId(UserId),
    UserAttribute(UserAttribute),
    IntegrityProtectedData(IntegrityProtectedData),
    ModificationDetectionCode(ModificationDetectionCode),
    Experimental(Opaque),
);
