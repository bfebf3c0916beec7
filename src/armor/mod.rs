//! ASCII armor encoding and decoding for PGP messages and keys.
//!
//! This module implements the ASCII armor format defined in RFC 4880 §6,
//! which allows binary PGP data to be represented as printable text
//! for safe transmission through text-only channels like email.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{PgpError, Result};

/// CRC-24 polynomial used for PGP armor checksums
const CRC24_POLY: u32 = 0x1864CFB;
const CRC24_INIT: u32 = 0xB704CE;

/// Default number of base64 characters per armor line
pub const DEFAULT_LINE_LENGTH: usize = 64;

/// ASCII armor message types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorType {
    /// PGP message (encrypted or signed data)
    Message,
    /// Public key block
    PublicKey,
    /// Private key block
    PrivateKey,
    /// Signature block
    Signature,
    /// Multi-part message
    MultiPartMessage { part: u32, total: u32 },
    /// Custom armor type
    Custom(String),
}

impl ArmorType {
    /// Get the armor header string for this type
    pub fn header_string(&self) -> String {
        match self {
            ArmorType::Message => "PGP MESSAGE".to_string(),
            ArmorType::PublicKey => "PGP PUBLIC KEY BLOCK".to_string(),
            ArmorType::PrivateKey => "PGP PRIVATE KEY BLOCK".to_string(),
            ArmorType::Signature => "PGP SIGNATURE".to_string(),
            ArmorType::MultiPartMessage { part, total } => {
                format!("PGP MESSAGE, PART {}/{}", part, total)
            }
            ArmorType::Custom(s) => s.clone(),
        }
    }

    /// Parse armor type from header string
    pub fn from_header_string(header: &str) -> Result<Self> {
        match header {
            "PGP MESSAGE" => Ok(ArmorType::Message),
            "PGP PUBLIC KEY BLOCK" => Ok(ArmorType::PublicKey),
            "PGP PRIVATE KEY BLOCK" => Ok(ArmorType::PrivateKey),
            "PGP SIGNATURE" => Ok(ArmorType::Signature),
            s => match s.strip_prefix("PGP MESSAGE, PART ") {
                Some(part_info) => {
                    let (part_str, total_str) = part_info
                        .split_once('/')
                        .ok_or_else(|| PgpError::armor("Invalid multi-part message format"))?;
                    let part = part_str.parse::<u32>().map_err(|_| {
                        PgpError::armor("Invalid part number in multi-part message")
                    })?;
                    let total = total_str.parse::<u32>().map_err(|_| {
                        PgpError::armor("Invalid total number in multi-part message")
                    })?;
                    Ok(ArmorType::MultiPartMessage { part, total })
                }
                None => Ok(ArmorType::Custom(s.to_string())),
            },
        }
    }
}

impl fmt::Display for ArmorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_string())
    }
}

/// Options for [`encode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorOptions {
    /// Armor headers (`Version`, `Comment`, ...) in output order
    pub headers: Vec<(String, String)>,
    /// Base64 characters per line
    pub line_length: usize,
}

impl Default for ArmorOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            line_length: DEFAULT_LINE_LENGTH,
        }
    }
}

impl ArmorOptions {
    /// Appends a header line.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Options for [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Verify the CRC24 trailer against the decoded data
    pub verify_crc: bool,
    /// Only accept a block with this marker; other blocks are skipped
    pub armor_type: Option<ArmorType>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_crc: true,
            armor_type: None,
        }
    }
}

/// ASCII armored data with headers and checksums
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmoredData {
    /// The type of armored data
    pub armor_type: ArmorType,
    /// Armor headers in the order they appeared
    pub headers: Vec<(String, String)>,
    /// The decoded binary data
    pub data: Vec<u8>,
    /// The CRC24 trailer, when one was present
    pub checksum: Option<u32>,
}

impl ArmoredData {
    /// Get the first value of a header
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Calculate CRC-24 checksum used in PGP armor
pub fn crc24(data: &[u8]) -> u32 {
    let mut crc = CRC24_INIT;

    for &byte in data {
        crc ^= (byte as u32) << 16;
        for _ in 0..8 {
            if (crc & 0x800000) != 0 {
                crc = (crc << 1) ^ CRC24_POLY;
            } else {
                crc <<= 1;
            }
            crc &= 0xFFFFFF;
        }
    }

    crc
}

/// Encode binary data as ASCII armored text
pub fn encode(data: &[u8], armor_type: &ArmorType, options: &ArmorOptions) -> Result<String> {
    if options.line_length == 0 {
        return Err(PgpError::invalid_input("Armor line length must be positive"));
    }

    let header_string = armor_type.header_string();
    let mut output = String::new();
    output.push_str(&format!("-----BEGIN {}-----\n", header_string));

    for (key, value) in &options.headers {
        if key.is_empty() || key.contains(':') || key.contains('\n') || value.contains('\n') {
            return Err(PgpError::invalid_input(format!(
                "Invalid armor header {:?}: {:?}",
                key, value
            )));
        }
        output.push_str(&format!("{}: {}\n", key, value));
    }
    output.push('\n');

    // Base64 output is ASCII, so byte chunks are character chunks
    let encoded = STANDARD.encode(data);
    for line in encoded.as_bytes().chunks(options.line_length) {
        output.push_str(&String::from_utf8_lossy(line));
        output.push('\n');
    }

    let checksum = crc24(data);
    output.push('=');
    output.push_str(&STANDARD.encode(&checksum.to_be_bytes()[1..]));
    output.push('\n');

    output.push_str(&format!("-----END {}-----\n", header_string));
    Ok(output)
}

/// Scanner states for [`decode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    Head,
    Body,
    End,
}

/// Decode ASCII armored text to binary data
pub fn decode(armored_text: &str, options: &DecodeOptions) -> Result<ArmoredData> {
    let mut state = State::Begin;
    let mut armor_type = None;
    let mut headers = Vec::new();
    let mut body = String::new();
    let mut checksum_text: Option<&str> = None;

    for raw in armored_text.lines() {
        let line = raw.trim_end();
        match state {
            State::Begin => {
                let Some(name) = line
                    .strip_prefix("-----BEGIN ")
                    .and_then(|rest| rest.strip_suffix("-----"))
                else {
                    continue;
                };
                let found = match ArmorType::from_header_string(name) {
                    Ok(found) => found,
                    Err(err) if options.armor_type.is_some() => {
                        trace!(marker = name, error = %err, "skipping unparsable armor block");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                if options.armor_type.as_ref().is_some_and(|want| *want != found) {
                    trace!(marker = name, "skipping armor block with other marker");
                    continue;
                }
                armor_type = Some(found);
                state = State::Head;
                trace!(marker = name, "armor begin");
            }
            State::Head => {
                if line.is_empty() {
                    state = State::Body;
                    trace!(headers = headers.len(), "armor headers done");
                } else if let Some((key, value)) = line.split_once(':') {
                    headers.push((key.trim().to_string(), value.trim().to_string()));
                } else {
                    // Missing blank separator: this is already body text
                    state = State::Body;
                    body.push_str(line.trim());
                }
            }
            State::Body => {
                if line.starts_with("-----END ") {
                    state = State::End;
                    trace!("armor end without checksum");
                } else if let Some(crc) = line
                    .strip_prefix('=')
                    .map(str::trim)
                    .filter(|crc| crc.len() == 4 && !crc.contains('='))
                {
                    // A bare padding line ("==") wrapped from the body is not a checksum
                    checksum_text = Some(crc);
                    state = State::End;
                    trace!("armor checksum");
                } else {
                    body.push_str(line.trim());
                }
            }
            State::End => break,
        }
    }

    let armor_type = match (state, armor_type) {
        (State::End, Some(armor_type)) => armor_type,
        (State::Begin, _) | (_, None) => return Err(PgpError::armor("No armor header found")),
        _ => return Err(PgpError::armor("Unexpected end of input inside armor")),
    };

    let data = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| PgpError::armor(format!("Invalid base64 data: {}", e)))?;

    let checksum = checksum_text.map(decode_checksum).transpose()?;
    if options.verify_crc {
        match checksum {
            Some(expected) => {
                let actual = crc24(&data);
                if actual != expected {
                    return Err(PgpError::ChecksumMismatch { expected, actual });
                }
            }
            None => warn!(marker = %armor_type, "armor has no CRC24 trailer; not verified"),
        }
    }

    Ok(ArmoredData {
        armor_type,
        headers,
        data,
        checksum,
    })
}

fn decode_checksum(text: &str) -> Result<u32> {
    let bytes = STANDARD
        .decode(text.as_bytes())
        .map_err(|e| PgpError::armor(format!("Invalid checksum encoding: {}", e)))?;
    match bytes.as_slice() {
        [a, b, c] => Ok(u32::from_be_bytes([0, *a, *b, *c])),
        _ => Err(PgpError::armor("Invalid checksum length")),
    }
}

/// Encodes with default options.
pub fn enarmor(data: &[u8], armor_type: &ArmorType) -> Result<String> {
    encode(data, armor_type, &ArmorOptions::default())
}

/// Decodes the first armor block with default options (CRC verified) and
/// returns its data.
pub fn dearmor(armored_text: &str) -> Result<Vec<u8>> {
    Ok(decode(armored_text, &DecodeOptions::default())?.data)
}

/// True when `data` looks like armored text rather than a binary packet
/// stream.
pub fn is_armored(data: &[u8]) -> bool {
    data.windows(15).any(|w| w == b"-----BEGIN PGP ")
}
