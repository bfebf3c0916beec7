//! Packet header framing (RFC 4880 §4.2).

use std::borrow::Cow;
use std::fmt;

use tracing::trace;

use crate::buffer::{Buffer, BufferWrite};
use crate::error::{PgpError, Result};
use crate::validation::Limits;

/// Old (bits 2-5 tag) or new (bits 0-5 tag) header framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderFormat {
    Old,
    New,
}

impl fmt::Display for HeaderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Old => "old",
            Self::New => "new",
        })
    }
}

/// Body length as announced by a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyLength {
    /// The body is exactly this many bytes.
    Fixed(usize),
    /// First chunk of a partial body; more length octets follow the chunk.
    Partial(usize),
    /// Old-format length type 3: the body runs to the end of the input.
    Indeterminate,
}

/// A decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Packet tag
    pub tag: u8,
    /// Framing the header was (or will be) written in
    pub format: HeaderFormat,
    /// Announced body length
    pub length: BodyLength,
}

impl PacketHeader {
    /// Create a new-format header for a body of `length` bytes
    pub fn new(tag: u8, length: usize) -> Self {
        Self {
            tag,
            format: HeaderFormat::New,
            length: BodyLength::Fixed(length),
        }
    }

    /// Create an old-format header for a body of `length` bytes
    pub fn old_format(tag: u8, length: usize) -> Self {
        Self {
            tag,
            format: HeaderFormat::Old,
            length: BodyLength::Fixed(length),
        }
    }

    /// Parses a header, leaving `input` at the first body byte.
    pub fn parse(input: &mut Buffer<'_>) -> Result<Self> {
        let first = input.read_byte()?;
        if first & 0x80 == 0 {
            return Err(PgpError::malformed_header(format!(
                "Packet tag octet {:#04x} does not have bit 7 set",
                first
            )));
        }

        if first & 0x40 != 0 {
            return Ok(Self {
                tag: first & 0x3f,
                format: HeaderFormat::New,
                length: read_new_length(input)?,
            });
        }

        let length = match first & 0x03 {
            0 => BodyLength::Fixed(input.read_byte()? as usize),
            1 => BodyLength::Fixed(input.read_u16()? as usize),
            2 => BodyLength::Fixed(input.read_u32()? as usize),
            _ => BodyLength::Indeterminate,
        };
        Ok(Self {
            tag: (first >> 2) & 0x0f,
            format: HeaderFormat::Old,
            length,
        })
    }

    /// Reads the body this header announces.
    ///
    /// Partial chunks are joined into one owned body; otherwise the body
    /// borrows from `input`.
    pub fn read_body<'a>(&self, input: &mut Buffer<'a>, limits: &Limits) -> Result<Cow<'a, [u8]>> {
        match self.length {
            BodyLength::Fixed(len) => {
                limits.validate_packet_size(len)?;
                Ok(Cow::Borrowed(input.read_bytes(len)?))
            }
            BodyLength::Indeterminate => {
                limits.validate_packet_size(input.remaining())?;
                Ok(Cow::Borrowed(input.read_rest()))
            }
            BodyLength::Partial(first) => {
                let mut body = Vec::new();
                let mut chunk = first;
                let mut chunks = 1;
                loop {
                    limits.validate_packet_size(body.len().saturating_add(chunk))?;
                    body.extend_from_slice(input.read_bytes(chunk)?);
                    match read_new_length(input)? {
                        BodyLength::Partial(next) => {
                            chunk = next;
                            chunks += 1;
                        }
                        BodyLength::Fixed(last) => {
                            limits.validate_packet_size(body.len().saturating_add(last))?;
                            body.extend_from_slice(input.read_bytes(last)?);
                            break;
                        }
                        BodyLength::Indeterminate => {
                            return Err(PgpError::malformed_header(
                                "Indeterminate length inside a partial body",
                            ))
                        }
                    }
                }
                trace!(tag = self.tag, chunks = chunks + 1, len = body.len(), "joined partial body");
                Ok(Cow::Owned(body))
            }
        }
    }

    /// Serialize the header to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(6);
        match self.format {
            HeaderFormat::New => {
                if self.tag > 0x3f {
                    return Err(PgpError::invalid_input(format!(
                        "Tag {} does not fit a new-format header",
                        self.tag
                    )));
                }
                bytes.write_byte(0xc0 | self.tag);
                match self.length {
                    BodyLength::Fixed(len) if len < 192 => bytes.write_byte(len as u8),
                    BodyLength::Fixed(len) if len < 8384 => {
                        let len = len - 192;
                        bytes.write_byte(192 + (len >> 8) as u8);
                        bytes.write_byte((len & 0xff) as u8);
                    }
                    BodyLength::Fixed(len) => {
                        bytes.write_byte(0xff);
                        bytes.write_u32(length_u32(len)?);
                    }
                    BodyLength::Partial(len) => {
                        if !len.is_power_of_two() || len > 1 << 30 {
                            return Err(PgpError::invalid_input(format!(
                                "Partial chunk of {} bytes is not a power of two up to 2^30",
                                len
                            )));
                        }
                        bytes.write_byte(224 + len.trailing_zeros() as u8);
                    }
                    BodyLength::Indeterminate => {
                        return Err(PgpError::invalid_input(
                            "Indeterminate length needs an old-format header",
                        ))
                    }
                }
            }
            HeaderFormat::Old => {
                if self.tag > 0x0f {
                    return Err(PgpError::invalid_input(format!(
                        "Tag {} does not fit an old-format header",
                        self.tag
                    )));
                }
                let tag_bits = 0x80 | (self.tag << 2);
                match self.length {
                    BodyLength::Fixed(len) if len < 0x100 => {
                        bytes.write_byte(tag_bits);
                        bytes.write_byte(len as u8);
                    }
                    BodyLength::Fixed(len) if len < 0x1_0000 => {
                        bytes.write_byte(tag_bits | 1);
                        bytes.write_u16(len as u16);
                    }
                    BodyLength::Fixed(len) => {
                        bytes.write_byte(tag_bits | 2);
                        bytes.write_u32(length_u32(len)?);
                    }
                    BodyLength::Indeterminate => bytes.write_byte(tag_bits | 3),
                    BodyLength::Partial(_) => {
                        return Err(PgpError::invalid_input(
                            "Partial lengths need a new-format header",
                        ))
                    }
                }
            }
        }
        Ok(bytes)
    }
}

fn length_u32(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| PgpError::invalid_input(format!("Body of {} bytes is too long", len)))
}

fn read_new_length(input: &mut Buffer<'_>) -> Result<BodyLength> {
    let first = input.read_byte()?;
    Ok(match first {
        0..=191 => BodyLength::Fixed(first as usize),
        192..=223 => {
            let second = input.read_byte()?;
            BodyLength::Fixed(((first as usize - 192) << 8) + second as usize + 192)
        }
        224..=254 => BodyLength::Partial(1 << (first & 0x1f)),
        255 => BodyLength::Fixed(input.read_u32()? as usize),
    })
}
