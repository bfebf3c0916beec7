//! OpenPGP-CFB symmetric encryption (RFC 4880 §13.9).
//!
//! The construction prepends one random block plus a two-byte repeat of its
//! tail (the quick check), resynchronises the feedback register on the
//! ciphertext, then runs plain CFB over the data.

use subtle::ConstantTimeEq;
use tracing::trace;

use crate::crypto::{BlockCipher, CryptoEngine, Passphrase, SymmetricAlgorithm};
use crate::error::{PgpError, Result};
use crate::s2k::S2k;

/// OpenPGP-CFB over a keyed block cipher from a [`CryptoEngine`].
pub struct Cipher<'e> {
    algorithm: SymmetricAlgorithm,
    engine: &'e dyn CryptoEngine,
    block: Box<dyn BlockCipher>,
}

impl<'e> Cipher<'e> {
    /// Keys `algorithm` with raw key bytes.
    pub fn new(
        engine: &'e dyn CryptoEngine,
        algorithm: SymmetricAlgorithm,
        key: &[u8],
    ) -> Result<Self> {
        let block = engine.block_cipher(algorithm, key)?;
        if block.block_size() < 2 {
            return Err(PgpError::engine_unavailable(format!(
                "{} block cipher reports a {}-byte block; OpenPGP-CFB needs at least 2",
                algorithm,
                block.block_size()
            )));
        }
        Ok(Self {
            algorithm,
            engine,
            block,
        })
    }

    /// Keys `algorithm` with a key derived from `passphrase` through `s2k`.
    pub fn with_passphrase(
        engine: &'e dyn CryptoEngine,
        algorithm: SymmetricAlgorithm,
        s2k: &S2k,
        passphrase: &Passphrase,
    ) -> Result<Self> {
        let key = s2k.derive_key(engine, passphrase, algorithm.key_size())?;
        Self::new(engine, algorithm, &key)
    }

    pub fn algorithm(&self) -> SymmetricAlgorithm {
        self.algorithm
    }

    pub fn block_size(&self) -> usize {
        self.block.block_size()
    }

    fn encrypt_register(&self, register: &[u8]) -> Vec<u8> {
        let mut out = register.to_vec();
        self.block.encrypt_block(&mut out);
        out
    }

    /// Encrypts `plaintext` behind a fresh random prefix.
    ///
    /// The output is `block_size + 2` bytes longer than the input.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let prefix = self.engine.random_bytes(self.block_size())?;
        self.encrypt_with_prefix(&prefix, plaintext)
    }

    fn encrypt_with_prefix(&self, prefix: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let bs = self.block_size();
        if prefix.len() != bs {
            return Err(PgpError::engine_unavailable(format!(
                "random source returned {} bytes, wanted {}",
                prefix.len(),
                bs
            )));
        }

        let mut out = Vec::with_capacity(bs + 2 + plaintext.len());

        let zero = vec![0u8; bs];
        let e1 = self.encrypt_register(&zero);
        out.extend(e1.iter().zip(prefix).map(|(e, r)| e ^ r));

        let e2 = self.encrypt_register(&out[..bs]);
        out.push(e2[0] ^ prefix[bs - 2]);
        out.push(e2[1] ^ prefix[bs - 1]);

        let mut register = out[2..bs + 2].to_vec();
        for chunk in plaintext.chunks(bs) {
            let keystream = self.encrypt_register(&register);
            let block: Vec<u8> = chunk.iter().zip(&keystream).map(|(p, k)| p ^ k).collect();
            out.extend_from_slice(&block);
            register = block;
        }

        trace!(
            algorithm = %self.algorithm,
            plaintext_len = plaintext.len(),
            "OpenPGP-CFB encrypt"
        );
        Ok(out)
    }

    /// Decrypts OpenPGP-CFB ciphertext, checking the two-byte quick check
    /// before returning the data.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let bs = self.block_size();
        if ciphertext.len() < bs + 2 {
            return Err(PgpError::invalid_input(format!(
                "Ciphertext of {} bytes is shorter than the {}-byte prefix",
                ciphertext.len(),
                bs + 2
            )));
        }

        let zero = vec![0u8; bs];
        let e1 = self.encrypt_register(&zero);
        let prefix: Vec<u8> = e1.iter().zip(&ciphertext[..bs]).map(|(e, c)| e ^ c).collect();

        let e2 = self.encrypt_register(&ciphertext[..bs]);
        let check = [e2[0] ^ ciphertext[bs], e2[1] ^ ciphertext[bs + 1]];
        let expected = [prefix[bs - 2], prefix[bs - 1]];
        if !bool::from(check[..].ct_eq(&expected[..])) {
            return Err(PgpError::ChecksumMismatch {
                expected: u16::from_be_bytes(expected) as u32,
                actual: u16::from_be_bytes(check) as u32,
            });
        }

        let mut out = Vec::with_capacity(ciphertext.len() - bs - 2);
        let mut register = ciphertext[2..bs + 2].to_vec();
        for chunk in ciphertext[bs + 2..].chunks(bs) {
            let keystream = self.encrypt_register(&register);
            out.extend(chunk.iter().zip(&keystream).map(|(c, k)| c ^ k));
            register = chunk.to_vec();
        }
        Ok(out)
    }
}
