//! Identity newtypes shared across the gateway: caller identities, target
//! addresses, and function selectors.
//!
//! Each is a distinct Rust newtype so a caller id can never be passed where
//! an address is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CallerId
// ---------------------------------------------------------------------------

/// Identity initiating a call, subject to approval and rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only identities are never valid principals.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caller:{}", self.0)
    }
}

impl From<&str> for CallerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// TargetAddress
// ---------------------------------------------------------------------------

/// Address of an independently invokable unit of functionality.
///
/// The all-zero address is reserved as "absent" and is rejected at
/// registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetAddress(pub [u8; 32]);

impl TargetAddress {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Address with the value in the trailing eight bytes, big-endian.
    /// Convenient for fixtures and small address spaces.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addr:{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// FunctionSelector
// ---------------------------------------------------------------------------

/// Named entry point on a target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionSelector(String);

impl FunctionSelector {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn:{}", self.0)
    }
}

impl From<&str> for FunctionSelector {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_id_blank_detection() {
        assert!(CallerId::new("").is_blank());
        assert!(CallerId::new("   ").is_blank());
        assert!(!CallerId::new("alice").is_blank());
    }

    #[test]
    fn zero_address_is_detected() {
        assert!(TargetAddress::new([0u8; 32]).is_zero());
        assert!(!TargetAddress::from_low_u64(1).is_zero());
    }

    #[test]
    fn from_low_u64_is_big_endian_in_tail() {
        let addr = TargetAddress::from_low_u64(0x0102);
        assert_eq!(addr.0[30], 0x01);
        assert_eq!(addr.0[31], 0x02);
        assert!(addr.0[..24].iter().all(|b| *b == 0));
    }

    #[test]
    fn display_renderings_are_prefixed() {
        assert_eq!(CallerId::new("u1").to_string(), "caller:u1");
        assert!(TargetAddress::from_low_u64(7).to_string().starts_with("addr:"));
        assert_eq!(FunctionSelector::new("transfer").to_string(), "fn:transfer");
    }

    #[test]
    fn address_hex_round_trips() {
        let addr = TargetAddress::from_low_u64(0xdead_beef);
        let hex = addr.to_hex();
        assert_eq!(hex.len(), 64);
        let decoded = hex::decode(&hex).expect("hex decode");
        assert_eq!(decoded.as_slice(), addr.as_bytes());
    }

    #[test]
    fn serde_round_trips() {
        let caller = CallerId::new("alice");
        let json = serde_json::to_string(&caller).expect("serialize");
        let decoded: CallerId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, caller);

        let addr = TargetAddress::from_low_u64(42);
        let json = serde_json::to_string(&addr).expect("serialize");
        let decoded: TargetAddress = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, addr);

        let selector = FunctionSelector::new("get_balance");
        let json = serde_json::to_string(&selector).expect("serialize");
        let decoded: FunctionSelector = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, selector);
    }
}
