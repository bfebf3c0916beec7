//! Passphrase handling for string-to-key derivation.

use std::fmt;
use zeroize::Zeroize;

/// A passphrase fed to S2K derivation. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(Vec<u8>);

impl Passphrase {
    /// Create a new passphrase from raw bytes
    pub fn new(passphrase: impl Into<Vec<u8>>) -> Self {
        Self(passphrase.into())
    }

    /// Get passphrase as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if passphrase is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(..)")
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
