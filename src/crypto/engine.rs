//! Default crypto engine backed by the RustCrypto crates and the OS RNG.

use cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use digest::DynDigest;
use rand::{rngs::OsRng, RngCore};

use crate::crypto::{BlockCipher, CryptoEngine, HashAlgorithm, SymmetricAlgorithm};
use crate::error::{PgpError, Result};

/// [`CryptoEngine`] built on RustCrypto digests and block ciphers.
///
/// Supports every hash in [`HashAlgorithm`] and every cipher in
/// [`SymmetricAlgorithm`] except IDEA and the plaintext placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoEngine;

impl RustCryptoEngine {
    pub fn new() -> Self {
        Self
    }
}

struct Keyed<C>(C);

impl<C: BlockEncrypt> BlockCipher for Keyed<C> {
    fn block_size(&self) -> usize {
        C::block_size()
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        self.0.encrypt_block(GenericArray::from_mut_slice(block));
    }
}

fn keyed<C>(algorithm: SymmetricAlgorithm, key: &[u8]) -> Result<Box<dyn BlockCipher>>
where
    C: BlockEncrypt + KeyInit + 'static,
{
    let cipher = C::new_from_slice(key).map_err(|_| {
        PgpError::invalid_input(format!(
            "{} needs a {}-byte key, got {}",
            algorithm,
            algorithm.key_size(),
            key.len()
        ))
    })?;
    Ok(Box::new(Keyed(cipher)))
}

impl CryptoEngine for RustCryptoEngine {
    fn random_bytes(&self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; count];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| PgpError::engine_unavailable(format!("OS random source: {}", e)))?;
        Ok(bytes)
    }

    fn hasher(&self, algorithm: HashAlgorithm) -> Result<Box<dyn DynDigest>> {
        Ok(match algorithm {
            HashAlgorithm::Md5 => Box::new(md5::Md5::default()),
            HashAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            HashAlgorithm::Ripemd160 => Box::new(ripemd::Ripemd160::default()),
            HashAlgorithm::Sha224 => Box::new(sha2::Sha224::default()),
            HashAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            HashAlgorithm::Sha384 => Box::new(sha2::Sha384::default()),
            HashAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
        })
    }

    fn block_cipher(
        &self,
        algorithm: SymmetricAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn BlockCipher>> {
        match algorithm {
            SymmetricAlgorithm::Aes128 => keyed::<aes::Aes128>(algorithm, key),
            SymmetricAlgorithm::Aes192 => keyed::<aes::Aes192>(algorithm, key),
            SymmetricAlgorithm::Aes256 => keyed::<aes::Aes256>(algorithm, key),
            SymmetricAlgorithm::Cast5 => keyed::<cast5::Cast5>(algorithm, key),
            SymmetricAlgorithm::Blowfish => keyed::<blowfish::Blowfish>(algorithm, key),
            SymmetricAlgorithm::Twofish => keyed::<twofish::Twofish>(algorithm, key),
            SymmetricAlgorithm::TripleDes => keyed::<des::TdesEde3>(algorithm, key),
            SymmetricAlgorithm::Idea | SymmetricAlgorithm::Plaintext => {
                Err(PgpError::unsupported_algorithm("symmetric", algorithm.id()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_sizes_match_engine_output() {
        let engine = RustCryptoEngine::new();
        for alg in [
            HashAlgorithm::Md5,
            HashAlgorithm::Sha1,
            HashAlgorithm::Ripemd160,
            HashAlgorithm::Sha224,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            let out = engine.digest(alg, b"abc").unwrap();
            assert_eq!(out.len(), engine.digest_size(alg).unwrap(), "{}", alg);
        }
    }

    #[test]
    fn test_known_digest() {
        let engine = RustCryptoEngine::new();
        let md5 = engine.digest(HashAlgorithm::Md5, b"").unwrap();
        assert_eq!(hex::encode(md5), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_block_sizes() {
        let engine = RustCryptoEngine::new();
        for alg in [
            SymmetricAlgorithm::Aes128,
            SymmetricAlgorithm::Aes192,
            SymmetricAlgorithm::Aes256,
            SymmetricAlgorithm::Cast5,
            SymmetricAlgorithm::Blowfish,
            SymmetricAlgorithm::Twofish,
            SymmetricAlgorithm::TripleDes,
        ] {
            let key = vec![0x42u8; alg.key_size()];
            let cipher = engine.block_cipher(alg, &key).unwrap();
            assert_eq!(cipher.block_size(), alg.block_size(), "{}", alg);
        }
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        let engine = RustCryptoEngine::new();
        assert!(engine
            .block_cipher(SymmetricAlgorithm::Aes256, &[0u8; 16])
            .is_err());
        assert!(matches!(
            engine.block_cipher(SymmetricAlgorithm::Idea, &[0u8; 16]),
            Err(PgpError::UnsupportedAlgorithm { id: 1, .. })
        ));
    }

    #[test]
    fn test_random_bytes_length() {
        let engine = RustCryptoEngine::new();
        assert_eq!(engine.random_bytes(24).unwrap().len(), 24);
        assert_ne!(engine.random_bytes(16).unwrap(), vec![0u8; 16]);
    }
}
