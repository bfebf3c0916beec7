//! Small value types shared by the packet codecs.

use std::fmt;

use crate::error::{PgpError, Result};

/// A multiprecision integer: big-endian magnitude bytes.
///
/// Leading zero octets carry no bits and are dropped on construction, so two
/// MPIs compare equal exactly when their values do and every MPI serializes
/// to its minimal wire form.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Mpi(Vec<u8>);

impl Mpi {
    /// Wraps big-endian magnitude bytes, dropping leading zero octets.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        bytes.drain(..start);
        Self(bytes)
    }

    /// The minimal magnitude bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length of the magnitude.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the zero MPI.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bit length as written in the two-octet MPI prefix: the position of
    /// the highest set bit, or 0 when no bit is set.
    pub fn bit_len(&self) -> usize {
        match self.0.first() {
            None => 0,
            Some(&first) => self.0.len() * 8 - first.leading_zeros() as usize,
        }
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREFIX: usize = 8;
        write!(
            f,
            "Mpi({} bits, {}",
            self.bit_len(),
            hex::encode(&self.0[..self.0.len().min(PREFIX)])
        )?;
        if self.0.len() > PREFIX {
            f.write_str("..")?;
        }
        f.write_str(")")
    }
}

impl From<Vec<u8>> for Mpi {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Mpi {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

/// A 64-bit OpenPGP key id, rendered as 16 uppercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct KeyId([u8; 8]);

impl KeyId {
    /// Wraps eight key id octets.
    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Takes the low-order eight octets of a longer value (fingerprint or
    /// modulus).
    pub fn from_low_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(PgpError::invalid_input(format!(
                "Key id needs 8 bytes, got {}",
                bytes.len()
            )));
        }
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[bytes.len() - 8..]);
        Ok(Self(id))
    }

    /// Parses 16 hex digits.
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut id = [0u8; 8];
        hex::decode_to_slice(text, &mut id)
            .map_err(|e| PgpError::invalid_input(format!("Invalid key id {:?}: {}", text, e)))?;
        Ok(Self(id))
    }

    /// The raw octets.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The key id as a big-endian integer.
    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Uppercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.to_hex())
    }
}

/// A key fingerprint: SHA-1 for v4 keys, MD5 for legacy keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Uppercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpi_bit_length() {
        assert_eq!(Mpi::new(vec![]).bit_len(), 0);
        assert_eq!(Mpi::new(vec![0x01]).bit_len(), 1);
        assert_eq!(Mpi::new(vec![0x01, 0x00, 0x01]).bit_len(), 17);
        assert_eq!(Mpi::new(vec![0xff, 0xff]).bit_len(), 16);
        assert_eq!(Mpi::new(vec![0x00, 0x80]).bit_len(), 8);
        assert_eq!(Mpi::new(vec![0x00]).bit_len(), 0);
    }

    #[test]
    fn test_mpi_equality_ignores_leading_zeros() {
        let padded = Mpi::new(vec![0x00, 0xc5, 0x01]);
        assert_eq!(padded.as_bytes(), &[0xc5, 0x01]);
        assert_eq!(padded, Mpi::new(vec![0xc5, 0x01]));
        assert_eq!(Mpi::from(&[0u8, 0][..]), Mpi::default());
        assert!(Mpi::new(vec![0x00, 0x00]).is_empty());
    }

    #[test]
    fn test_mpi_debug_shows_value_prefix() {
        assert_eq!(format!("{:?}", Mpi::new(vec![0x01, 0xff])), "Mpi(9 bits, 01ff)");
        assert_eq!(
            format!("{:?}", Mpi::new(vec![0xab; 20])),
            "Mpi(160 bits, abababababababab..)"
        );
        assert_ne!(
            format!("{:?}", Mpi::new(vec![0xc5, 0x01])),
            format!("{:?}", Mpi::new(vec![0xc5, 0x02]))
        );
    }

    #[test]
    fn test_key_id_rendering_keeps_leading_zeros() {
        let id = KeyId::new([0, 0, 0, 0x12, 0x34, 0x56, 0x78, 0x9a]);
        assert_eq!(id.to_hex(), "000000123456789A");
        assert_eq!(KeyId::from_hex("000000123456789a").unwrap(), id);
    }

    #[test]
    fn test_key_id_from_low_bytes() {
        let fpr: Vec<u8> = (0u8..20).collect();
        let id = KeyId::from_low_bytes(&fpr).unwrap();
        assert_eq!(id.as_bytes(), &[12, 13, 14, 15, 16, 17, 18, 19]);
        assert!(KeyId::from_low_bytes(&[1, 2, 3]).is_err());
    }
}
