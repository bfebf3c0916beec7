//! # pgpcore - OpenPGP message format core
//!
//! An implementation of the RFC 4880 message format in Rust: the binary
//! packet framing, string-to-key derivation, ASCII armor and the OpenPGP-CFB
//! symmetric construction. Digests, block ciphers and randomness come from a
//! pluggable [`CryptoEngine`].
//!
//! ## Features
//!
//! - **Packet framing**: old and new format headers, all length encodings,
//!   partial body chaining
//! - **Typed packets**: keys, signatures, user ids, literal data, session keys
//!   and the rest of the RFC 4880 tag table, with byte-exact round trips
//! - **S2K**: simple, salted and iterated-and-salted key derivation
//! - **Armor**: encoding and decoding with CRC24 verification
//! - **Symmetric encryption**: passphrase-based messages over OpenPGP-CFB
//!
//! Asymmetric encryption, signing and verification are not implemented.
//!
//! ## Examples
//!
//! ### Parsing a key block
//!
//! ```rust,no_run
//! use pgpcore::{Message, Packet, RustCryptoEngine};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let text = std::fs::read_to_string("alice.asc")?;
//! let message = Message::parse_armored(&text)?;
//! let engine = RustCryptoEngine::new();
//! for packet in &message {
//!     if let Packet::PublicKey(key) = packet {
//!         println!("{} {}", key.key_id(&engine)?, key.fingerprint(&engine)?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Passphrase encryption
//!
//! ```rust,no_run
//! use pgpcore::{ArmorOptions, ArmorType, EncryptOptions, Message, RustCryptoEngine};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RustCryptoEngine::new();
//! let options = EncryptOptions::with_passphrase("correct horse battery staple");
//! let message = Message::encrypt("Secret message", &options, &engine)?;
//! println!("{}", message.to_armored(&ArmorType::Message, &ArmorOptions::default())?);
//! # Ok(())
//! # }
//! ```

pub mod armor;
pub mod buffer;
pub mod crypto;
pub mod error;
pub mod message;
pub mod packet;
pub mod s2k;
pub mod types;
pub mod validation;

pub use armor::{dearmor, enarmor, ArmorOptions, ArmorType, DecodeOptions};
pub use buffer::{Buffer, BufferWrite};
pub use crypto::{Cipher, CryptoEngine, Passphrase, RustCryptoEngine};
pub use error::{PgpError, Result};
pub use message::{EncryptOptions, Message, Plaintext};
pub use packet::{Packet, PacketType};
pub use s2k::{S2k, S2kMode};
pub use types::{Fingerprint, KeyId, Mpi};
pub use validation::Limits;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Key and signature packet version written by default
pub const PGP_VERSION: u8 = 4;
