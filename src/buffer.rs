//! Cursor over an in-memory byte sequence with RFC 4880 field codecs.
//!
//! [`Buffer`] reads primitive fields (RFC 4880 §3) from a borrowed slice and
//! never moves its cursor past the end: a read that does not fit fails with
//! [`PgpError::UnexpectedEof`] and leaves the cursor where it was.
//! [`BufferWrite`] provides the matching writers on `Vec<u8>`.

use crate::error::{PgpError, Result};
use crate::s2k::S2k;
use crate::types::Mpi;

/// Read cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Buffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Buffer<'a> {
    /// Creates a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(PgpError::UnexpectedEof {
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Returns the next byte without consuming it.
    pub fn peek_byte(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    /// Reads one byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Consumes and returns everything left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    /// Splits off the next `len` bytes as an independent cursor.
    pub fn sub_buffer(&mut self, len: usize) -> Result<Buffer<'a>> {
        Ok(Buffer::new(self.read_bytes(len)?))
    }

    /// Reads a one-octet length followed by that many bytes.
    pub fn read_string(&mut self) -> Result<&'a [u8]> {
        let len = self.peek_byte()? as usize;
        self.ensure(1 + len)?;
        self.pos += 1;
        self.read_bytes(len)
    }

    /// Reads a big-endian two-octet scalar.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian four-octet scalar.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads a four-octet timestamp (seconds since the epoch).
    pub fn read_timestamp(&mut self) -> Result<u32> {
        self.read_u32()
    }

    /// Reads a `count`-octet big-endian number.
    ///
    /// Numbers wider than 64 bits are rejected; use
    /// [`read_number_hex`](Self::read_number_hex) for rendering wider values.
    pub fn read_number(&mut self, count: usize) -> Result<u64> {
        if count > 8 {
            return Err(PgpError::invalid_input(format!(
                "Cannot read a {}-octet number into 64 bits",
                count
            )));
        }
        let bytes = self.read_bytes(count)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Reads a `count`-octet number rendered as uppercase hex, two digits per
    /// octet.
    pub fn read_number_hex(&mut self, count: usize) -> Result<String> {
        Ok(hex::encode_upper(self.read_bytes(count)?))
    }

    /// Reads a multiprecision integer.
    ///
    /// The two-octet bit count is authoritative: `ceil(bits / 8)` bytes follow,
    /// and the highest set bit of those bytes must sit exactly at `bits`.
    pub fn read_mpi(&mut self) -> Result<Mpi> {
        self.ensure(2)?;
        let bits = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]) as usize;
        let len = bits.div_ceil(8);
        self.ensure(2 + len)?;
        let mpi = Mpi::new(&self.data[self.pos + 2..self.pos + 2 + len]);
        if mpi.bit_len() != bits {
            return Err(PgpError::malformed_header(format!(
                "MPI bit count {} does not match its {}-bit value",
                bits,
                mpi.bit_len()
            )));
        }
        self.pos += 2 + len;
        Ok(mpi)
    }

    /// Reads a string-to-key specifier.
    pub fn read_s2k(&mut self) -> Result<S2k> {
        let start = self.pos;
        S2k::parse(self).inspect_err(|_| self.pos = start)
    }
}

/// Writers mirroring the [`Buffer`] readers.
pub trait BufferWrite {
    /// Writes one byte.
    fn write_byte(&mut self, value: u8);

    /// Writes raw bytes.
    fn write_bytes(&mut self, value: &[u8]);

    /// Writes a one-octet length prefix and the bytes.
    fn write_string(&mut self, value: &[u8]) -> Result<()>;

    /// Writes a big-endian two-octet scalar.
    fn write_u16(&mut self, value: u16);

    /// Writes a big-endian four-octet scalar.
    fn write_u32(&mut self, value: u32);

    /// Writes a four-octet timestamp.
    fn write_timestamp(&mut self, value: u32) {
        self.write_u32(value);
    }

    /// Writes the low `count` octets of `value`, big-endian.
    fn write_number(&mut self, value: u64, count: usize) -> Result<()>;

    /// Writes a multiprecision integer with its bit-count prefix.
    fn write_mpi(&mut self, value: &Mpi) -> Result<()>;

    /// Writes a string-to-key specifier.
    fn write_s2k(&mut self, value: &S2k);
}

impl BufferWrite for Vec<u8> {
    fn write_byte(&mut self, value: u8) {
        self.push(value);
    }

    fn write_bytes(&mut self, value: &[u8]) {
        self.extend_from_slice(value);
    }

    fn write_string(&mut self, value: &[u8]) -> Result<()> {
        let len = u8::try_from(value.len()).map_err(|_| {
            PgpError::invalid_input(format!(
                "String of {} bytes does not fit a one-octet length",
                value.len()
            ))
        })?;
        self.push(len);
        self.extend_from_slice(value);
        Ok(())
    }

    fn write_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn write_number(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 8 || (count < 8 && value >> (count * 8) != 0) {
            return Err(PgpError::invalid_input(format!(
                "{} does not fit in {} octets",
                value, count
            )));
        }
        self.extend_from_slice(&value.to_be_bytes()[8 - count..]);
        Ok(())
    }

    fn write_mpi(&mut self, value: &Mpi) -> Result<()> {
        let bits = u16::try_from(value.bit_len()).map_err(|_| {
            PgpError::invalid_input(format!("MPI of {} bits is too large", value.bit_len()))
        })?;
        self.write_u16(bits);
        self.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn write_s2k(&mut self, value: &S2k) {
        value.write_to(self);
    }
}
