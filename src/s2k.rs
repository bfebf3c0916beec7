//! String-to-key (S2K) specifiers (RFC 4880 §3.7).
//!
//! An [`S2k`] describes how a passphrase becomes a symmetric key: which
//! digest to use, an optional 8-byte salt and, for the iterated variant, how
//! many bytes of `salt || passphrase` to feed the digest. Salts are chosen
//! once, at construction, and never change afterwards.

use serde::{Deserialize, Serialize};
use tracing::trace;
use zeroize::Zeroizing;

use crate::buffer::{Buffer, BufferWrite};
use crate::crypto::{CryptoEngine, HashAlgorithm, Passphrase};
use crate::error::{PgpError, Result};

/// Salt length for salted and iterated specifiers.
pub const SALT_LEN: usize = 8;

/// Iteration count used when none is requested.
pub const DEFAULT_COUNT: u32 = 65_536;

/// Smallest encodable iteration count (coded octet 0).
pub const MIN_COUNT: u32 = 1_024;

/// Largest encodable iteration count (coded octet 255).
pub const MAX_COUNT: u32 = 65_011_712;

const EXPBIAS: u32 = 6;

/// Decodes the one-octet iteration count.
pub fn decode_count(coded: u8) -> u32 {
    (16 + (coded as u32 & 15)) << ((coded as u32 >> 4) + EXPBIAS)
}

/// Encodes an iteration count as the smallest coded octet whose decoded value
/// is at least `count`, saturating at 255.
pub fn encode_count(count: u32) -> u8 {
    if count <= MIN_COUNT {
        return 0;
    }
    (0..=255u8)
        .find(|&coded| decode_count(coded) >= count)
        .unwrap_or(255)
}

/// S2K variants, as chosen by the mode octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum S2kMode {
    /// Mode 0: hash the passphrase.
    Simple,
    /// Mode 1: hash salt and passphrase.
    Salted,
    /// Mode 3: hash salt and passphrase repeatedly.
    #[default]
    Iterated,
}

impl S2kMode {
    pub fn id(self) -> u8 {
        match self {
            Self::Simple => 0,
            Self::Salted => 1,
            Self::Iterated => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Specifier {
    Simple {
        hash: HashAlgorithm,
    },
    Salted {
        hash: HashAlgorithm,
        salt: [u8; SALT_LEN],
    },
    Iterated {
        hash: HashAlgorithm,
        salt: [u8; SALT_LEN],
        count: u32,
    },
    Private {
        mode: u8,
        data: Vec<u8>,
    },
}

/// A string-to-key specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S2k(Specifier);

impl S2k {
    /// Simple S2K.
    pub fn simple(hash: HashAlgorithm) -> Self {
        Self(Specifier::Simple { hash })
    }

    /// Salted S2K with a fresh salt from `engine`.
    pub fn salted(engine: &dyn CryptoEngine, hash: HashAlgorithm) -> Result<Self> {
        Ok(Self::salted_with(hash, fresh_salt(engine)?))
    }

    /// Salted S2K with a caller-supplied salt.
    pub fn salted_with(hash: HashAlgorithm, salt: [u8; SALT_LEN]) -> Self {
        Self(Specifier::Salted { hash, salt })
    }

    /// Iterated and salted S2K with a fresh salt from `engine`.
    ///
    /// `count` is rounded up to the nearest encodable value so the in-memory
    /// count always matches what goes on the wire.
    pub fn iterated(engine: &dyn CryptoEngine, hash: HashAlgorithm, count: u32) -> Result<Self> {
        Ok(Self::iterated_with(hash, fresh_salt(engine)?, count))
    }

    /// Iterated and salted S2K with a caller-supplied salt.
    pub fn iterated_with(hash: HashAlgorithm, salt: [u8; SALT_LEN], count: u32) -> Self {
        Self(Specifier::Iterated {
            hash,
            salt,
            count: decode_count(encode_count(count)),
        })
    }

    /// Builds the specifier for `mode`, drawing a salt when the mode needs one.
    pub fn for_mode(
        engine: &dyn CryptoEngine,
        mode: S2kMode,
        hash: HashAlgorithm,
        count: u32,
    ) -> Result<Self> {
        match mode {
            S2kMode::Simple => Ok(Self::simple(hash)),
            S2kMode::Salted => Self::salted(engine, hash),
            S2kMode::Iterated => Self::iterated(engine, hash, count),
        }
    }

    /// Mode octet.
    pub fn mode(&self) -> u8 {
        match &self.0 {
            Specifier::Simple { .. } => S2kMode::Simple.id(),
            Specifier::Salted { .. } => S2kMode::Salted.id(),
            Specifier::Iterated { .. } => S2kMode::Iterated.id(),
            Specifier::Private { mode, .. } => *mode,
        }
    }

    /// Digest algorithm; `None` for private/experimental specifiers.
    pub fn hash(&self) -> Option<HashAlgorithm> {
        match &self.0 {
            Specifier::Simple { hash } | Specifier::Salted { hash, .. } | Specifier::Iterated { hash, .. } => {
                Some(*hash)
            }
            Specifier::Private { .. } => None,
        }
    }

    pub fn salt(&self) -> Option<&[u8; SALT_LEN]> {
        match &self.0 {
            Specifier::Salted { salt, .. } | Specifier::Iterated { salt, .. } => Some(salt),
            _ => None,
        }
    }

    /// Decoded iteration count (bytes hashed), iterated mode only.
    pub fn count(&self) -> Option<u32> {
        match &self.0 {
            Specifier::Iterated { count, .. } => Some(*count),
            _ => None,
        }
    }

    /// Opaque body of a private/experimental specifier (modes 100-110).
    pub fn private_data(&self) -> Option<&[u8]> {
        match &self.0 {
            Specifier::Private { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Parses a specifier. Private modes consume the rest of `input`.
    pub fn parse(input: &mut Buffer<'_>) -> Result<Self> {
        let mode = input.read_byte()?;
        let spec = match mode {
            0 => Specifier::Simple {
                hash: HashAlgorithm::try_from(input.read_byte()?)?,
            },
            1 => Specifier::Salted {
                hash: HashAlgorithm::try_from(input.read_byte()?)?,
                salt: input.read_array()?,
            },
            3 => Specifier::Iterated {
                hash: HashAlgorithm::try_from(input.read_byte()?)?,
                salt: input.read_array()?,
                count: decode_count(input.read_byte()?),
            },
            100..=110 => Specifier::Private {
                mode,
                data: input.read_rest().to_vec(),
            },
            other => {
                return Err(PgpError::malformed_header(format!(
                    "invalid S2K mode {}",
                    other
                )))
            }
        };
        Ok(Self(spec))
    }

    /// Appends the wire form.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.write_byte(self.mode());
        match &self.0 {
            Specifier::Simple { hash } => out.write_byte(hash.id()),
            Specifier::Salted { hash, salt } => {
                out.write_byte(hash.id());
                out.write_bytes(salt);
            }
            Specifier::Iterated { hash, salt, count } => {
                out.write_byte(hash.id());
                out.write_bytes(salt);
                out.write_byte(encode_count(*count));
            }
            Specifier::Private { data, .. } => out.write_bytes(data),
        }
    }

    /// Wire form as a new vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// Derives a `key_len`-byte key from `passphrase`.
    ///
    /// When `key_len` exceeds the digest size, further digest contexts are
    /// run with 1, 2, ... zero octets preloaded and their outputs appended.
    pub fn derive_key(
        &self,
        engine: &dyn CryptoEngine,
        passphrase: &Passphrase,
        key_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let hash = self.hash().ok_or_else(|| {
            PgpError::unsupported_operation(format!(
                "key derivation with private S2K mode {}",
                self.mode()
            ))
        })?;
        let digest_size = engine.digest_size(hash)?;
        if digest_size == 0 {
            return Err(PgpError::engine_unavailable(format!(
                "{} reports an empty digest",
                hash
            )));
        }

        let mut key = Zeroizing::new(Vec::with_capacity(key_len + digest_size));
        let mut preload = 0;
        while key.len() < key_len {
            let mut hasher = engine.hasher(hash)?;
            hasher.update(&vec![0u8; preload]);
            self.feed(passphrase.as_bytes(), &mut |chunk: &[u8]| hasher.update(chunk));
            key.extend_from_slice(&hasher.finalize());
            preload += 1;
        }
        key.truncate(key_len);

        trace!(mode = self.mode(), %hash, key_len, contexts = preload, "S2K key derived");
        Ok(key)
    }

    fn feed(&self, passphrase: &[u8], update: &mut dyn FnMut(&[u8])) {
        match &self.0 {
            Specifier::Simple { .. } => update(passphrase),
            Specifier::Salted { salt, .. } => {
                update(salt);
                update(passphrase);
            }
            Specifier::Iterated { salt, count, .. } => {
                let mut preimage = Zeroizing::new(Vec::with_capacity(SALT_LEN + passphrase.len()));
                preimage.extend_from_slice(salt);
                preimage.extend_from_slice(passphrase);

                // The whole preimage is hashed at least once; otherwise exactly
                // `count` bytes, the final repetition truncated.
                let mut left = (*count as usize).max(preimage.len());
                while left > 0 {
                    let take = left.min(preimage.len());
                    update(&preimage[..take]);
                    left -= take;
                }
            }
            Specifier::Private { .. } => {}
        }
    }
}

fn fresh_salt(engine: &dyn CryptoEngine) -> Result<[u8; SALT_LEN]> {
    let bytes = engine.random_bytes(SALT_LEN)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        PgpError::engine_unavailable(format!(
            "random source returned {} bytes, wanted {}",
            v.len(),
            SALT_LEN
        ))
    })
}
