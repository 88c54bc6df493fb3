//! Owner, pause flag and authorized operators shared by both components
//!
//! `AccessControl` is plain state; the owning component holds it inside its
//! state mutex and emits events for the transitions reported here.

use ledger_types::{Address, LedgerError, LedgerEvent, LedgerResult};
use std::collections::BTreeSet;
use tracing::warn;

/// Administrative transition requested of an [`AccessControl`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AdminAction {
    Pause,
    Unpause,
    TransferOwnership(Address),
    AddOperator(Address),
    RemoveOperator(Address),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessControl {
    owner: Address,
    paused: bool,
    operators: BTreeSet<Address>,
}

impl AccessControl {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            paused: false,
            operators: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_owner(&self, who: &Address) -> bool {
        *who == self.owner
    }

    /// Owner or a registered authorized operator.
    pub fn is_authorized(&self, who: &Address) -> bool {
        self.is_owner(who) || self.operators.contains(who)
    }

    pub fn require_owner(&self, caller: &Address) -> LedgerResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, "Owner-only call rejected");
            Err(LedgerError::NotOwner(caller.clone()))
        }
    }

    pub fn require_not_paused(&self) -> LedgerResult<()> {
        if self.paused {
            Err(LedgerError::Paused)
        } else {
            Ok(())
        }
    }

    /// Returns the previous owner.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> LedgerResult<Address> {
        self.require_owner(caller)?;
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }

    pub fn pause(&mut self, caller: &Address) -> LedgerResult<()> {
        if !self.is_authorized(caller) {
            warn!(caller = %caller, "Pause rejected");
            return Err(LedgerError::NotAuthorized(caller.clone()));
        }
        self.require_not_paused()?;
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    pub fn add_authorized_operator(
        &mut self,
        caller: &Address,
        operator: Address,
    ) -> LedgerResult<()> {
        self.require_owner(caller)?;
        if !self.operators.insert(operator.clone()) {
            return Err(LedgerError::AuthorizedOperatorExists(operator));
        }
        Ok(())
    }

    pub fn remove_authorized_operator(
        &mut self,
        caller: &Address,
        operator: &Address,
    ) -> LedgerResult<()> {
        self.require_owner(caller)?;
        if !self.operators.remove(operator) {
            return Err(LedgerError::AuthorizedOperatorMissing(operator.clone()));
        }
        Ok(())
    }

    /// Apply `action` for `caller`, returning the event describing it.
    pub(crate) fn apply(
        &mut self,
        caller: &Address,
        action: AdminAction,
    ) -> LedgerResult<LedgerEvent> {
        match action {
            AdminAction::Pause => {
                self.pause(caller)?;
                Ok(LedgerEvent::PauseChanged {
                    paused: true,
                    changed_by: caller.clone(),
                })
            }
            AdminAction::Unpause => {
                self.unpause(caller)?;
                Ok(LedgerEvent::PauseChanged {
                    paused: false,
                    changed_by: caller.clone(),
                })
            }
            AdminAction::TransferOwnership(new_owner) => {
                let previous_owner = self.transfer_ownership(caller, new_owner.clone())?;
                Ok(LedgerEvent::OwnershipTransferred {
                    previous_owner,
                    new_owner,
                })
            }
            AdminAction::AddOperator(operator) => {
                self.add_authorized_operator(caller, operator.clone())?;
                Ok(LedgerEvent::AuthorizedOperatorChanged {
                    operator,
                    authorized: true,
                })
            }
            AdminAction::RemoveOperator(operator) => {
                self.remove_authorized_operator(caller, &operator)?;
                Ok(LedgerEvent::AuthorizedOperatorChanged {
                    operator,
                    authorized: false,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_types::ErrorKind;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn test_pause_rules() {
        let mut ac = AccessControl::new(addr("owner"));
        ac.add_authorized_operator(&addr("owner"), addr("guardian")).unwrap();

        assert_eq!(
            ac.pause(&addr("mallory")).unwrap_err().kind(),
            ErrorKind::Authorization
        );
        ac.pause(&addr("guardian")).unwrap();
        assert!(ac.is_paused());
        assert_eq!(ac.pause(&addr("owner")).unwrap_err(), LedgerError::Paused);
        assert_eq!(ac.require_not_paused().unwrap_err(), LedgerError::Paused);

        // only the owner lifts a pause
        assert!(matches!(
            ac.unpause(&addr("guardian")),
            Err(LedgerError::NotOwner(_))
        ));
        ac.unpause(&addr("owner")).unwrap();
        assert_eq!(ac.unpause(&addr("owner")).unwrap_err(), LedgerError::NotPaused);
    }

    #[test]
    fn test_operator_registry() {
        let mut ac = AccessControl::new(addr("owner"));
        let owner = addr("owner");

        ac.add_authorized_operator(&owner, addr("op")).unwrap();
        assert!(ac.is_authorized(&addr("op")));
        assert_eq!(
            ac.add_authorized_operator(&owner, addr("op")).unwrap_err(),
            LedgerError::AuthorizedOperatorExists(addr("op"))
        );
        assert!(ac.add_authorized_operator(&addr("op"), addr("x")).is_err());

        ac.remove_authorized_operator(&owner, &addr("op")).unwrap();
        assert!(!ac.is_authorized(&addr("op")));
        assert_eq!(
            ac.remove_authorized_operator(&owner, &addr("op")).unwrap_err().kind(),
            ErrorKind::State
        );
    }

    #[test]
    fn test_transfer_ownership() {
        let mut ac = AccessControl::new(addr("owner"));
        assert!(ac.transfer_ownership(&addr("bob"), addr("bob")).is_err());

        let previous = ac.transfer_ownership(&addr("owner"), addr("bob")).unwrap();
        assert_eq!(previous, addr("owner"));
        assert_eq!(ac.owner(), &addr("bob"));
        assert!(ac.require_owner(&addr("owner")).is_err());
    }

    #[test]
    fn test_apply_reports_event() {
        let mut ac = AccessControl::new(addr("owner"));
        let event = ac.apply(&addr("owner"), AdminAction::Pause).unwrap();
        assert_eq!(
            event,
            LedgerEvent::PauseChanged {
                paused: true,
                changed_by: addr("owner"),
            }
        );

        let before = ac.clone();
        assert!(ac
            .apply(&addr("mallory"), AdminAction::AddOperator(addr("mallory")))
            .is_err());
        assert_eq!(ac, before);
    }
}
