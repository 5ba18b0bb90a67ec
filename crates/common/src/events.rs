//! Ledger Events
//!
//! State-changing pool events. The monitor only uses them as refresh
//! triggers for the account they name; payload amounts are not needed.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::Address;

/// Event kinds that change a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LedgerEventKind {
    Deposit = 0x01,
    Withdraw = 0x02,
    Borrow = 0x03,
    Repay = 0x04,
}

impl LedgerEventKind {
    /// Changes the account's collateral shares
    pub fn touches_collateral(&self) -> bool {
        matches!(self, Self::Deposit | Self::Withdraw)
    }

    /// Changes the account's principal and recorded index
    pub fn touches_debt(&self) -> bool {
        matches!(self, Self::Borrow | Self::Repay)
    }
}

/// One observed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LedgerEvent {
    pub kind: LedgerEventKind,
    pub account: Address,
    pub block_number: u64,
}

impl LedgerEvent {
    pub fn new(kind: LedgerEventKind, account: Address, block_number: u64) -> Self {
        Self { kind, account, block_number }
    }

    /// Whether this event concerns `account`
    pub fn is_for(&self, account: &Address) -> bool {
        self.account == *account
    }

    /// Serialize event to bytes for transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kinds() {
        assert!(LedgerEventKind::Deposit.touches_collateral());
        assert!(!LedgerEventKind::Deposit.touches_debt());
        assert!(LedgerEventKind::Repay.touches_debt());
    }

    #[test]
    fn test_event_serialization() {
        let event = LedgerEvent::new(LedgerEventKind::Borrow, Address([7u8; 20]), 1_234);
        let bytes = event.to_bytes();

        // discriminant, 20 address bytes, u64 block
        assert_eq!(bytes.len(), 1 + 20 + 8);
        assert_eq!(bytes[0], 0x03);
        assert_eq!(LedgerEvent::from_bytes(&bytes), Some(event));
        assert_eq!(LedgerEvent::from_bytes(&bytes[..4]), None);
    }

    #[test]
    fn test_event_json() {
        let json = r#"{"kind":"repay","account":"0x0707070707070707070707070707070707070707","block_number":9}"#;
        let event: LedgerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, LedgerEventKind::Repay);
        assert!(event.is_for(&Address([7u8; 20])));
        assert!(!event.is_for(&Address::default()));
    }
}
