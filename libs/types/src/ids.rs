//! Identifier types for vault participants and operations
//!
//! Participants are plain 20-byte addresses. Redemptions get a UUID v7 so the
//! initiate and settle records of one operation can be correlated in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use alloy_primitives::{address, Address, U256};

/// Unspendable sink that holds the dead shares minted at construction.
///
/// Nobody holds a key for this address; the vault additionally refuses to
/// debit it.
pub const DEAD_ADDRESS: Address = address!("000000000000000000000000000000000000dEaD");

/// Unique identifier for a redemption
///
/// Uses UUID v7 for time-based sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedemptionId(Uuid);

impl RedemptionId {
    /// Create a new RedemptionId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RedemptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_address_is_not_zero() {
        assert_ne!(DEAD_ADDRESS, Address::ZERO);
        assert_eq!(&DEAD_ADDRESS.as_slice()[18..], &[0xdeu8, 0xad][..]);
    }

    #[test]
    fn test_redemption_id_unique() {
        let a = RedemptionId::new();
        let b = RedemptionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_redemption_id_time_sortable() {
        let first = RedemptionId::new();
        let second = RedemptionId::new();
        assert!(first.as_uuid() <= second.as_uuid());
    }

    #[test]
    fn test_redemption_id_serializes_transparently() {
        let id = RedemptionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: RedemptionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
