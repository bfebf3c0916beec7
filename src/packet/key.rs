//! Public and secret key packets (tags 5, 6, 7 and 14).

use std::sync::OnceLock;

use tracing::debug;

use crate::buffer::{Buffer, BufferWrite};
use crate::crypto::{CryptoEngine, HashAlgorithm, PublicKeyAlgorithm};
use crate::error::{PgpError, Result};
use crate::packet::{finish, read_mpis, PacketType};
use crate::types::{Fingerprint, KeyId, Mpi};

/// Public key material shared by primary keys and subkeys.
///
/// The fingerprint is computed on first request and cached; the key fields
/// cannot change after construction.
#[derive(Debug, Clone)]
pub struct PublicKey {
    version: u8,
    created: u32,
    validity_days: u16,
    algorithm: PublicKeyAlgorithm,
    mpis: Vec<Mpi>,
    fingerprint: OnceLock<Fingerprint>,
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.created == other.created
            && self.validity_days == other.validity_days
            && self.algorithm == other.algorithm
            && self.mpis == other.mpis
    }
}

impl Eq for PublicKey {}

impl PublicKey {
    /// Creates a version 4 key. `mpis` must list the algorithm's public
    /// parameters in wire order.
    pub fn new(created: u32, algorithm: PublicKeyAlgorithm, mpis: Vec<Mpi>) -> Result<Self> {
        Self::build(crate::PGP_VERSION, created, 0, algorithm, mpis)
    }

    /// Creates a legacy version 3 key with its validity period in days.
    pub fn new_v3(
        created: u32,
        validity_days: u16,
        algorithm: PublicKeyAlgorithm,
        mpis: Vec<Mpi>,
    ) -> Result<Self> {
        Self::build(3, created, validity_days, algorithm, mpis)
    }

    fn build(
        version: u8,
        created: u32,
        validity_days: u16,
        algorithm: PublicKeyAlgorithm,
        mpis: Vec<Mpi>,
    ) -> Result<Self> {
        let expected = algorithm.public_params().len();
        if mpis.len() != expected {
            return Err(PgpError::invalid_input(format!(
                "{} keys have {} public parameters, got {}",
                algorithm,
                expected,
                mpis.len()
            )));
        }
        Ok(Self {
            version,
            created,
            validity_days,
            algorithm,
            mpis,
            fingerprint: OnceLock::new(),
        })
    }

    pub(crate) fn read(input: &mut Buffer<'_>, tag: u8) -> Result<Self> {
        let version = input.read_byte()?;
        let (created, validity_days) = match version {
            2 | 3 => (input.read_timestamp()?, input.read_u16()?),
            4 => (input.read_timestamp()?, 0),
            other => {
                return Err(PgpError::malformed_packet(
                    tag,
                    format!("unsupported key version {}", other),
                ))
            }
        };
        let algorithm = PublicKeyAlgorithm::try_from(input.read_byte()?)?;
        let mpis = read_mpis(input, tag, algorithm.public_params().len())?;

        Ok(Self {
            version,
            created,
            validity_days,
            algorithm,
            mpis,
            fingerprint: OnceLock::new(),
        })
    }

    /// Parses a public key or public subkey body.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        let mut input = Buffer::new(body);
        let key = Self::read(&mut input, PacketType::PublicKey.to_byte())?;
        finish(&input, PacketType::PublicKey.to_byte())?;
        Ok(key)
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_byte(self.version);
        out.write_timestamp(self.created);
        if self.version < 4 {
            out.write_u16(self.validity_days);
        }
        out.write_byte(self.algorithm.id());
        for mpi in &self.mpis {
            out.write_mpi(mpi)?;
        }
        Ok(())
    }

    /// Serializes the packet body.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Creation time, seconds since the epoch.
    pub fn created(&self) -> u32 {
        self.created
    }

    /// Validity period in days for v2/v3 keys (0 means no expiry).
    pub fn validity_days(&self) -> Option<u16> {
        (self.version < 4).then_some(self.validity_days)
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    /// Public parameters in wire order.
    pub fn mpis(&self) -> &[Mpi] {
        &self.mpis
    }

    /// Named public parameters (`n`, `e`, `p`, ...) in wire order.
    pub fn params(&self) -> impl Iterator<Item = (&'static str, &Mpi)> {
        self.algorithm.public_params().iter().copied().zip(&self.mpis)
    }

    /// Looks up a public parameter by name.
    pub fn mpi(&self, name: &str) -> Option<&Mpi> {
        self.params().find(|(n, _)| *n == name).map(|(_, mpi)| mpi)
    }

    /// Key size in bits: the modulus for RSA, the prime for DSA/ElGamal.
    pub fn bits(&self) -> usize {
        self.mpis.first().map_or(0, Mpi::bit_len)
    }

    /// The key fingerprint.
    ///
    /// v4: SHA-1 over `0x99`, the two-octet body length and the body.
    /// v2/v3: MD5 over the RSA modulus and exponent magnitudes.
    pub fn fingerprint(&self, engine: &dyn CryptoEngine) -> Result<&Fingerprint> {
        if let Some(fingerprint) = self.fingerprint.get() {
            return Ok(fingerprint);
        }
        let computed = self.compute_fingerprint(engine)?;
        Ok(self.fingerprint.get_or_init(|| computed))
    }

    fn compute_fingerprint(&self, engine: &dyn CryptoEngine) -> Result<Fingerprint> {
        let digest = if self.version >= 4 {
            let body = self.to_bytes()?;
            let len = u16::try_from(body.len()).map_err(|_| {
                PgpError::invalid_input(format!("Key body of {} bytes is too long", body.len()))
            })?;
            let mut hasher = engine.hasher(HashAlgorithm::Sha1)?;
            hasher.update(&[0x99]);
            hasher.update(&len.to_be_bytes());
            hasher.update(&body);
            hasher.finalize().into_vec()
        } else {
            let (n, e) = self.rsa_params()?;
            let mut hasher = engine.hasher(HashAlgorithm::Md5)?;
            hasher.update(n.as_bytes());
            hasher.update(e.as_bytes());
            hasher.finalize().into_vec()
        };
        debug!(
            version = self.version,
            fingerprint = %hex::encode_upper(&digest),
            "computed fingerprint"
        );
        Ok(Fingerprint::new(digest))
    }

    fn rsa_params(&self) -> Result<(&Mpi, &Mpi)> {
        match (self.mpi("n"), self.mpi("e")) {
            (Some(n), Some(e)) => Ok((n, e)),
            _ => Err(PgpError::unsupported_algorithm(
                "public-key",
                self.algorithm.id(),
            )),
        }
    }

    /// The 64-bit key id.
    ///
    /// v4 keys use the low eight octets of the fingerprint; legacy keys use
    /// the low 64 bits of the RSA modulus.
    pub fn key_id(&self, engine: &dyn CryptoEngine) -> Result<KeyId> {
        if self.version >= 4 {
            KeyId::from_low_bytes(self.fingerprint(engine)?.as_bytes())
        } else {
            KeyId::from_low_bytes(self.rsa_params()?.0.as_bytes())
        }
    }
}

/// Secret key or secret subkey: the public key plus opaque secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey {
    public: PublicKey,
    secret: Vec<u8>,
}

impl SecretKey {
    pub fn new(public: PublicKey, secret: Vec<u8>) -> Self {
        Self { public, secret }
    }

    /// Parses a secret key or secret subkey body.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        let mut input = Buffer::new(body);
        let public = PublicKey::read(&mut input, PacketType::SecretKey.to_byte())?;
        Ok(Self {
            public,
            secret: input.read_rest().to_vec(),
        })
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        self.public.write_to(out)?;
        out.write_bytes(&self.secret);
        Ok(())
    }

    /// Serializes the packet body.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Everything after the public key fields, still encoded.
    pub fn secret_material(&self) -> &[u8] {
        &self.secret
    }

    /// The string-to-key usage octet (0 for unprotected material).
    pub fn s2k_usage(&self) -> Option<u8> {
        self.secret.first().copied()
    }
}
