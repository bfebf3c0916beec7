//! Literal data packets (tag 11).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::buffer::BufferWrite;
use crate::error::Result;
use crate::packet::{parse_whole, PacketType};

const TAG: u8 = PacketType::LiteralData as u8;

/// File name marking content that should only be displayed, never saved.
const CONSOLE: &[u8] = b"_CONSOLE";

/// How the literal payload should be interpreted.
///
/// Formats compare by their wire octet, so `Other(b't')` equals `Text`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum LiteralFormat {
    /// `b`
    #[default]
    Binary,
    /// `t`
    Text,
    /// `u`
    Utf8,
    /// Any other format octet, kept for round-tripping
    Other(u8),
}

impl LiteralFormat {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'b' => Self::Binary,
            b't' => Self::Text,
            b'u' => Self::Utf8,
            other => Self::Other(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Binary => b'b',
            Self::Text => b't',
            Self::Utf8 => b'u',
            Self::Other(byte) => byte,
        }
    }
}

impl PartialEq for LiteralFormat {
    fn eq(&self, other: &Self) -> bool {
        self.to_byte() == other.to_byte()
    }
}

impl Eq for LiteralFormat {}

impl Hash for LiteralFormat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_byte().hash(state);
    }
}

impl fmt::Display for LiteralFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_byte().escape_ascii())
    }
}

/// Literal data: the innermost payload of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralData {
    pub format: LiteralFormat,
    /// File name as raw bytes; at most 255 of them
    pub filename: Vec<u8>,
    /// Modification time, or 0
    pub timestamp: u32,
    pub data: Vec<u8>,
}

impl LiteralData {
    /// Binary literal data.
    pub fn new(filename: impl Into<Vec<u8>>, timestamp: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            format: LiteralFormat::Binary,
            filename: filename.into(),
            timestamp,
            data: data.into(),
        }
    }

    /// Binary literal data for display only ("for your eyes only").
    pub fn sensitive(timestamp: u32, data: impl Into<Vec<u8>>) -> Self {
        Self::new(CONSOLE, timestamp, data)
    }

    /// True when the sender asked for the content to be shown, not stored.
    pub fn is_sensitive(&self) -> bool {
        self.filename == CONSOLE
    }

    /// File name, lossily decoded for display.
    pub fn filename_lossy(&self) -> String {
        String::from_utf8_lossy(&self.filename).into_owned()
    }

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        parse_whole(TAG, body, |input| {
            Ok(Self {
                format: LiteralFormat::from_byte(input.read_byte()?),
                filename: input.read_string()?.to_vec(),
                timestamp: input.read_timestamp()?,
                data: input.read_rest().to_vec(),
            })
        })
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(6 + self.filename.len() + self.data.len());
        out.write_byte(self.format.to_byte());
        out.write_string(&self.filename)?;
        out.write_timestamp(self.timestamp);
        out.write_bytes(&self.data);
        Ok(out)
    }
}
