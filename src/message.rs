//! OpenPGP messages: ordered packet sequences.
//!
//! [`Message::parse`] turns a binary packet stream into packets and
//! [`Message::to_bytes`] writes them back with new-format headers.
//! [`Message::encrypt`] builds a passphrase-encrypted message out of an S2K
//! specifier, the OpenPGP-CFB cipher and a session key packet.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::armor::{self, ArmorOptions, ArmorType, DecodeOptions};
use crate::buffer::Buffer;
use crate::crypto::{Cipher, CryptoEngine, HashAlgorithm, Passphrase, SymmetricAlgorithm};
use crate::error::{PgpError, Result};
use crate::packet::{
    EncryptedData, LiteralData, Packet, PublicKey, SecretKey, SymmetricSessionKey,
};
use crate::s2k::{S2k, S2kMode, DEFAULT_COUNT};
use crate::validation::Limits;

/// Options for [`Message::encrypt`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptOptions {
    /// Symmetric cipher for the data
    pub cipher: SymmetricAlgorithm,
    /// Digest for the S2K derivation
    pub hash: HashAlgorithm,
    /// S2K variant used when no explicit specifier is given
    pub s2k_mode: S2kMode,
    /// Bytes hashed by an iterated S2K, rounded up to an encodable count
    pub s2k_count: u32,
    /// Explicit S2K specifier; overrides `hash`, `s2k_mode` and `s2k_count`
    #[serde(skip)]
    pub s2k: Option<S2k>,
    /// File name recorded when raw bytes are wrapped in literal data
    pub filename: String,
    /// Timestamp recorded when raw bytes are wrapped in literal data
    pub timestamp: u32,
    /// Public-key recipients. Not supported; must be empty
    pub recipients: Vec<String>,
    #[serde(skip)]
    pub passphrase: Option<Passphrase>,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            cipher: SymmetricAlgorithm::Aes128,
            hash: HashAlgorithm::Sha1,
            s2k_mode: S2kMode::Iterated,
            s2k_count: DEFAULT_COUNT,
            s2k: None,
            filename: String::new(),
            timestamp: 0,
            recipients: Vec::new(),
            passphrase: None,
        }
    }
}

impl EncryptOptions {
    /// Default options with a passphrase.
    pub fn with_passphrase(passphrase: impl Into<Passphrase>) -> Self {
        Self {
            passphrase: Some(passphrase.into()),
            ..Self::default()
        }
    }
}

/// Data accepted by [`Message::encrypt`].
#[derive(Debug, Clone)]
pub enum Plaintext {
    /// A whole packet stream
    Message(Message),
    /// A single packet
    Packet(Packet),
    /// Raw bytes, wrapped in a binary literal data packet
    Bytes(Vec<u8>),
}

impl Plaintext {
    fn to_bytes(&self, options: &EncryptOptions) -> Result<Vec<u8>> {
        match self {
            Self::Message(message) => message.to_bytes(),
            Self::Packet(packet) => packet.to_bytes(),
            Self::Bytes(data) => Packet::from(LiteralData::new(
                options.filename.as_bytes(),
                options.timestamp,
                data.as_slice(),
            ))
            .to_bytes(),
        }
    }
}

impl From<Message> for Plaintext {
    fn from(value: Message) -> Self {
        Self::Message(value)
    }
}

impl From<Packet> for Plaintext {
    fn from(value: Packet) -> Self {
        Self::Packet(value)
    }
}

impl From<Vec<u8>> for Plaintext {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Plaintext {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<&str> for Plaintext {
    fn from(value: &str) -> Self {
        Self::Bytes(value.as_bytes().to_vec())
    }
}

/// An ordered sequence of packets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    packets: Vec<Packet>,
}

impl Message {
    /// An empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a packet.
    pub fn push(&mut self, packet: impl Into<Packet>) {
        self.packets.push(packet.into());
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn into_packets(self) -> Vec<Packet> {
        self.packets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Packet> {
        self.packets.iter()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Parses a binary packet stream with the default [`Limits`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with_limits(data, &Limits::default())
    }

    /// Parses a binary packet stream.
    ///
    /// Any failure aborts the whole parse and is reported as
    /// [`PgpError::Parse`] with the offset of the offending packet header.
    pub fn parse_with_limits(data: &[u8], limits: &Limits) -> Result<Self> {
        let mut input = Buffer::new(data);
        let mut packets = Vec::new();
        while !input.is_empty() {
            let offset = input.position();
            limits
                .validate_packet_count(packets.len() + 1)
                .map_err(|e| e.at_offset(offset))?;
            let packet = Packet::read(&mut input, limits).map_err(|e| e.at_offset(offset))?;
            packets.push(packet);
        }
        debug!(packets = packets.len(), bytes = data.len(), "parsed message");
        Ok(Self { packets })
    }

    /// Decodes armored text and parses the packet stream inside.
    pub fn parse_armored(text: &str) -> Result<Self> {
        let armored = armor::decode(text, &DecodeOptions::default())?;
        Self::parse(&armored.data)
    }

    /// Serializes every packet with a new-format header.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for packet in &self.packets {
            out.extend_from_slice(&packet.to_bytes()?);
        }
        Ok(out)
    }

    /// Serializes and armors the message.
    pub fn to_armored(&self, armor_type: &ArmorType, options: &ArmorOptions) -> Result<String> {
        armor::encode(&self.to_bytes()?, armor_type, options)
    }

    /// Encrypts `data` under a passphrase.
    ///
    /// The result holds a symmetric session key packet carrying the S2K
    /// specifier, followed by an encrypted data packet. The S2K output is used
    /// directly as the session key.
    pub fn encrypt(
        data: impl Into<Plaintext>,
        options: &EncryptOptions,
        engine: &dyn CryptoEngine,
    ) -> Result<Self> {
        if !options.recipients.is_empty() {
            return Err(PgpError::unsupported_operation(
                "public-key encryption is not implemented",
            ));
        }
        let passphrase = options
            .passphrase
            .as_ref()
            .ok_or_else(|| PgpError::invalid_input("Symmetric encryption needs a passphrase"))?;

        let s2k = match &options.s2k {
            Some(s2k) => s2k.clone(),
            None => S2k::for_mode(engine, options.s2k_mode, options.hash, options.s2k_count)?,
        };
        let plaintext = data.into().to_bytes(options)?;
        let cipher = Cipher::with_passphrase(engine, options.cipher, &s2k, passphrase)?;
        let ciphertext = cipher.encrypt(&plaintext)?;

        debug!(
            cipher = %options.cipher,
            s2k_mode = s2k.mode(),
            plaintext_len = plaintext.len(),
            "encrypted message"
        );

        Ok(Self {
            packets: vec![
                SymmetricSessionKey::new(options.cipher, s2k).into(),
                EncryptedData::new(ciphertext).into(),
            ],
        })
    }

    /// Not implemented; always fails with [`PgpError::UnsupportedOperation`].
    pub fn decrypt(&self, _passphrase: &Passphrase) -> Result<Message> {
        Err(PgpError::unsupported_operation(
            "message decryption is not implemented",
        ))
    }

    /// Not implemented; always fails with [`PgpError::UnsupportedOperation`].
    pub fn sign(&self, _key: &SecretKey) -> Result<Message> {
        Err(PgpError::unsupported_operation("signing is not implemented"))
    }

    /// Not implemented; always fails with [`PgpError::UnsupportedOperation`].
    pub fn verify(&self, _key: &PublicKey) -> Result<bool> {
        Err(PgpError::unsupported_operation(
            "signature verification is not implemented",
        ))
    }
}

impl From<Vec<Packet>> for Message {
    fn from(packets: Vec<Packet>) -> Self {
        Self { packets }
    }
}

impl FromIterator<Packet> for Message {
    fn from_iter<I: IntoIterator<Item = Packet>>(iter: I) -> Self {
        Self {
            packets: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = Packet;
    type IntoIter = std::vec::IntoIter<Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.packets.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Packet;
    type IntoIter = std::slice::Iter<'a, Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.packets.iter()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for packet in &self.packets {
            writeln!(f, "{}", packet)?;
        }
        Ok(())
    }
}
