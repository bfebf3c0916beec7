//! Algorithm identifiers and the crypto engine capability interface.
//!
//! The OpenPGP framing in this crate never implements a digest or block
//! cipher itself. Everything goes through a [`CryptoEngine`], chosen once by
//! the caller and passed to the operations that need it:
//!
//! - **Randomness**: IV prefixes and S2K salts
//! - **Digests**: S2K derivation and key fingerprints
//! - **Block ciphers**: single-block encryption for OpenPGP-CFB
//!
//! [`RustCryptoEngine`] is the default engine.

use digest::DynDigest;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PgpError, Result};

pub mod cipher;
pub mod engine;
pub mod password;

pub use cipher::Cipher;
pub use engine::RustCryptoEngine;
pub use password::Passphrase;

/// Hash algorithms (RFC 4880 §9.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Md5 = 1,
    Sha1 = 2,
    Ripemd160 = 3,
    Sha256 = 8,
    Sha384 = 9,
    Sha512 = 10,
    Sha224 = 11,
}

impl HashAlgorithm {
    /// Wire identifier.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a wire identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Md5),
            2 => Some(Self::Sha1),
            3 => Some(Self::Ripemd160),
            8 => Some(Self::Sha256),
            9 => Some(Self::Sha384),
            10 => Some(Self::Sha512),
            11 => Some(Self::Sha224),
            _ => None,
        }
    }

    /// Output size in bytes.
    pub fn digest_size(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 | Self::Ripemd160 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Ripemd160 => "RIPEMD160",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
            Self::Sha224 => "SHA224",
        }
    }
}

impl TryFrom<u8> for HashAlgorithm {
    type Error = PgpError;

    fn try_from(id: u8) -> Result<Self> {
        Self::from_id(id).ok_or_else(|| PgpError::unsupported_algorithm("hash", id))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Symmetric-key algorithms (RFC 4880 §9.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymmetricAlgorithm {
    Plaintext = 0,
    Idea = 1,
    TripleDes = 2,
    Cast5 = 3,
    Blowfish = 4,
    Aes128 = 7,
    Aes192 = 8,
    Aes256 = 9,
    Twofish = 10,
}

impl SymmetricAlgorithm {
    /// Wire identifier.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a wire identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Plaintext),
            1 => Some(Self::Idea),
            2 => Some(Self::TripleDes),
            3 => Some(Self::Cast5),
            4 => Some(Self::Blowfish),
            7 => Some(Self::Aes128),
            8 => Some(Self::Aes192),
            9 => Some(Self::Aes256),
            10 => Some(Self::Twofish),
            _ => None,
        }
    }

    /// Key size in bytes.
    pub fn key_size(self) -> usize {
        match self {
            Self::Plaintext => 0,
            Self::Idea | Self::Cast5 | Self::Blowfish | Self::Aes128 => 16,
            Self::TripleDes | Self::Aes192 => 24,
            Self::Aes256 | Self::Twofish => 32,
        }
    }

    /// Block size in bytes.
    pub fn block_size(self) -> usize {
        match self {
            Self::Plaintext => 0,
            Self::Idea | Self::TripleDes | Self::Cast5 | Self::Blowfish => 8,
            Self::Aes128 | Self::Aes192 | Self::Aes256 | Self::Twofish => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Plaintext => "Plaintext",
            Self::Idea => "IDEA",
            Self::TripleDes => "TripleDES",
            Self::Cast5 => "CAST5",
            Self::Blowfish => "Blowfish",
            Self::Aes128 => "AES128",
            Self::Aes192 => "AES192",
            Self::Aes256 => "AES256",
            Self::Twofish => "Twofish",
        }
    }
}

impl TryFrom<u8> for SymmetricAlgorithm {
    type Error = PgpError;

    fn try_from(id: u8) -> Result<Self> {
        Self::from_id(id).ok_or_else(|| PgpError::unsupported_algorithm("symmetric", id))
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Public-key algorithms (RFC 4880 §9.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicKeyAlgorithm {
    Rsa = 1,
    RsaEncrypt = 2,
    RsaSign = 3,
    Elgamal = 16,
    Dsa = 17,
}

impl PublicKeyAlgorithm {
    /// Wire identifier.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a wire identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Rsa),
            2 => Some(Self::RsaEncrypt),
            3 => Some(Self::RsaSign),
            16 => Some(Self::Elgamal),
            17 => Some(Self::Dsa),
            _ => None,
        }
    }

    /// Names of the public key MPIs, in wire order.
    pub fn public_params(self) -> &'static [&'static str] {
        match self {
            Self::Rsa | Self::RsaEncrypt | Self::RsaSign => &["n", "e"],
            Self::Elgamal => &["p", "g", "y"],
            Self::Dsa => &["p", "q", "g", "y"],
        }
    }

    /// Number of MPIs in a signature made with this algorithm.
    pub fn signature_mpis(self) -> Option<usize> {
        match self {
            Self::Rsa | Self::RsaSign => Some(1),
            Self::Dsa => Some(2),
            Self::RsaEncrypt | Self::Elgamal => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::RsaEncrypt => "RSA-E",
            Self::RsaSign => "RSA-S",
            Self::Elgamal => "ELG-E",
            Self::Dsa => "DSA",
        }
    }
}

impl TryFrom<u8> for PublicKeyAlgorithm {
    type Error = PgpError;

    fn try_from(id: u8) -> Result<Self> {
        Self::from_id(id).ok_or_else(|| PgpError::unsupported_algorithm("public-key", id))
    }
}

impl fmt::Display for PublicKeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compression algorithms (RFC 4880 §9.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    Uncompressed = 0,
    Zip = 1,
    Zlib = 2,
    Bzip2 = 3,
}

impl CompressionAlgorithm {
    /// Looks up a wire identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Uncompressed),
            1 => Some(Self::Zip),
            2 => Some(Self::Zlib),
            3 => Some(Self::Bzip2),
            _ => None,
        }
    }
}

/// A keyed block cipher able to encrypt single blocks.
pub trait BlockCipher {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Encrypts one block in place. `block.len()` must equal the block size.
    fn encrypt_block(&self, block: &mut [u8]);
}

/// Capability interface for the primitives the OpenPGP framing consumes.
pub trait CryptoEngine {
    /// Returns `count` bytes from a secure random source.
    fn random_bytes(&self, count: usize) -> Result<Vec<u8>>;

    /// Starts a streaming digest.
    fn hasher(&self, algorithm: HashAlgorithm) -> Result<Box<dyn DynDigest>>;

    /// Keys a block cipher.
    fn block_cipher(
        &self,
        algorithm: SymmetricAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn BlockCipher>>;

    /// One-shot digest of `data`.
    fn digest(&self, algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        let mut hasher = self.hasher(algorithm)?;
        hasher.update(data);
        Ok(hasher.finalize().into_vec())
    }

    /// Digest output size in bytes.
    fn digest_size(&self, algorithm: HashAlgorithm) -> Result<usize> {
        Ok(algorithm.digest_size())
    }
}
