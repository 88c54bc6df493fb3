//! The governance capability the treasury trusts
//!
//! Privileged treasury calls are accepted from the owner or from whoever
//! the [`Authority`] recognises as governance. In production that is the
//! [`GovernanceEngine`](crate::GovernanceEngine) identity.

use ledger_types::Address;

pub trait Authority: Send + Sync {
    /// Whether `caller` acts with governance authority.
    fn is_governance(&self, caller: &Address) -> bool;
}

/// Recognises a single fixed governance address.
#[derive(Clone, Debug)]
pub struct StaticAuthority {
    governance: Address,
}

impl StaticAuthority {
    pub fn new(governance: Address) -> Self {
        Self { governance }
    }
}

impl Authority for StaticAuthority {
    fn is_governance(&self, caller: &Address) -> bool {
        *caller == self.governance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_authority() {
        let authority = StaticAuthority::new(Address::new("governance"));
        assert!(authority.is_governance(&Address::new("governance")));
        assert!(!authority.is_governance(&Address::new("owner")));
    }
}
