//! Identifiers: caller identities, tokens, proposals, payments

use serde::{Deserialize, Serialize};

/// Unix time in whole seconds
pub type Timestamp = u64;

/// Length of the operator withdrawal window and the default proposal cooldown
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Opaque identity of a caller or account
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a fungible token held in custody
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential proposal identifier, starting at 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub u64);

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proposal-{}", self.0)
    }
}

/// Sequential scheduled-payment identifier, starting at 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub u64);

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "payment-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Address::new("alice").to_string(), "alice");
        assert_eq!(TokenId::new("USDC").to_string(), "USDC");
        assert_eq!(ProposalId(3).to_string(), "proposal-3");
        assert_eq!(PaymentId(0).to_string(), "payment-0");
    }

    #[test]
    fn test_ordering() {
        assert!(ProposalId(1) < ProposalId(2));
        assert!(Address::new("a") < Address::new("b"));
    }
}
