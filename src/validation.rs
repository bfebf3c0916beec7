//! Resource limits applied while parsing untrusted packet streams.
//!
//! Header lengths are checked against these limits before any body bytes are
//! copied, so a forged four-octet length cannot force a large allocation.

use serde::{Deserialize, Serialize};

use crate::error::{PgpError, Result};

/// Maximum allowed packet body size (50MB)
pub const MAX_PACKET_SIZE: usize = 50 * 1024 * 1024;

/// Maximum allowed number of packets in a message
pub const MAX_PACKETS_PER_MESSAGE: usize = 10_000;

/// Limits for [`Message::parse_with_limits`](crate::message::Message::parse_with_limits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted body, after partial chunks are joined
    pub max_packet_size: usize,
    /// Largest accepted number of packets
    pub max_packets: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            max_packets: MAX_PACKETS_PER_MESSAGE,
        }
    }
}

impl Limits {
    /// No limits beyond available memory.
    pub fn unlimited() -> Self {
        Self {
            max_packet_size: usize::MAX,
            max_packets: usize::MAX,
        }
    }

    /// Validate a packet body size
    pub fn validate_packet_size(&self, size: usize) -> Result<()> {
        if size > self.max_packet_size {
            return Err(PgpError::validation(format!(
                "Packet body of {} bytes exceeds maximum of {} bytes",
                size, self.max_packet_size
            )));
        }
        Ok(())
    }

    /// Validate the number of packets parsed so far
    pub fn validate_packet_count(&self, count: usize) -> Result<()> {
        if count > self.max_packets {
            return Err(PgpError::validation(format!(
                "Message has more than {} packets",
                self.max_packets
            )));
        }
        Ok(())
    }
}
