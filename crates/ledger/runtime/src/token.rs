//! Token collaborators: the balance oracle and the transfer primitive
//!
//! The ledger never moves value itself. Governance reads voting weight
//! through [`TokenOracle`]; the treasury moves custody through
//! [`TokenTransfer`]. [`InMemoryToken`] implements both for tests and
//! single-process embeddings.

use ledger_types::{Address, Amount, TokenId};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Errors reported by token collaborators
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("{account} holds {available} {token}, {required} required")]
    InsufficientFunds {
        token: TokenId,
        account: Address,
        required: Amount,
        available: Amount,
    },

    #[error("{spender} may move {available} {token} from {owner}, {required} required")]
    InsufficientAllowance {
        token: TokenId,
        owner: Address,
        spender: Address,
        required: Amount,
        available: Amount,
    },

    #[error("token supply overflow for {0}")]
    SupplyOverflow(TokenId),

    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error("token backend unavailable")]
    Unavailable,
}

/// Read-only view of the governance token
pub trait TokenOracle: Send + Sync {
    fn balance_of(&self, account: &Address) -> Result<Amount, TokenError>;
    fn total_supply(&self) -> Result<Amount, TokenError>;
}

/// Value movement primitive used for all custody changes
pub trait TokenTransfer: Send + Sync {
    /// Move `amount` of `token` owned by `from` to `to`.
    fn transfer(
        &self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Move `amount` of `token` from `from` to `to` on behalf of `spender`,
    /// consuming the allowance `from` granted to `spender`.
    fn transfer_from(
        &self,
        token: &TokenId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;
}

#[derive(Default)]
struct Book {
    balances: HashMap<(TokenId, Address), Amount>,
    allowances: HashMap<(TokenId, Address, Address), Amount>,
    supplies: HashMap<TokenId, Amount>,
}

impl Book {
    fn balance(&self, token: &TokenId, account: &Address) -> Amount {
        self.balances
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn move_funds(
        &mut self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.balance(token, from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientFunds {
                token: token.clone(),
                account: from.clone(),
                required: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(token, to)
            .checked_add(amount)
            .ok_or_else(|| TokenError::SupplyOverflow(token.clone()))?;

        self.balances.insert((token.clone(), from.clone()), remaining);
        self.balances.insert((token.clone(), to.clone()), credited);
        Ok(())
    }
}

/// Multi-token in-memory ledger.
///
/// One token is designated the governance token; the [`TokenOracle`]
/// implementation answers for it.
pub struct InMemoryToken {
    governance_token: TokenId,
    book: Mutex<Book>,
}

impl InMemoryToken {
    pub fn new(governance_token: TokenId) -> Self {
        Self {
            governance_token,
            book: Mutex::new(Book::default()),
        }
    }

    pub fn governance_token(&self) -> &TokenId {
        &self.governance_token
    }

    fn book(&self) -> std::sync::MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create `amount` of `token` in `account`.
    pub fn mint(
        &self,
        token: &TokenId,
        account: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut book = self.book();
        let supply = book
            .supplies
            .get(token)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| TokenError::SupplyOverflow(token.clone()))?;
        let balance = book
            .balance(token, account)
            .checked_add(amount)
            .ok_or_else(|| TokenError::SupplyOverflow(token.clone()))?;
        book.supplies.insert(token.clone(), supply);
        book.balances.insert((token.clone(), account.clone()), balance);
        debug!(token = %token, account = %account, amount = %amount, "Minted");
        Ok(())
    }

    /// Destroy `amount` of `token` held by `account`.
    pub fn burn(
        &self,
        token: &TokenId,
        account: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut book = self.book();
        let available = book.balance(token, account);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientFunds {
                token: token.clone(),
                account: account.clone(),
                required: amount,
                available,
            })?;
        let supply = book.supplies.get(token).copied().unwrap_or_default();
        book.supplies
            .insert(token.clone(), supply.saturating_sub(amount));
        book.balances.insert((token.clone(), account.clone()), remaining);
        Ok(())
    }

    /// Let `spender` move up to `amount` of the owner's `token`.
    pub fn approve(&self, token: &TokenId, owner: &Address, spender: &Address, amount: Amount) {
        self.book()
            .allowances
            .insert((token.clone(), owner.clone(), spender.clone()), amount);
    }

    pub fn balance(&self, token: &TokenId, account: &Address) -> Amount {
        self.book().balance(token, account)
    }

    pub fn allowance(&self, token: &TokenId, owner: &Address, spender: &Address) -> Amount {
        self.book()
            .allowances
            .get(&(token.clone(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    pub fn supply(&self, token: &TokenId) -> Amount {
        self.book().supplies.get(token).copied().unwrap_or_default()
    }
}

impl TokenOracle for InMemoryToken {
    fn balance_of(&self, account: &Address) -> Result<Amount, TokenError> {
        Ok(self.balance(&self.governance_token, account))
    }

    fn total_supply(&self) -> Result<Amount, TokenError> {
        Ok(self.supply(&self.governance_token))
    }
}

impl TokenTransfer for InMemoryToken {
    fn transfer(
        &self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.book().move_funds(token, from, to, amount)?;
        debug!(token = %token, from = %from, to = %to, amount = %amount, "Transferred");
        Ok(())
    }

    fn transfer_from(
        &self,
        token: &TokenId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut book = self.book();
        let key = (token.clone(), from.clone(), spender.clone());
        let available = book.allowances.get(&key).copied().unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientAllowance {
                token: token.clone(),
                owner: from.clone(),
                spender: spender.clone(),
                required: amount,
                available,
            })?;
        book.move_funds(token, from, to, amount)?;
        book.allowances.insert(key, remaining);
        debug!(
            token = %token,
            spender = %spender,
            from = %from,
            to = %to,
            amount = %amount,
            "Transferred from"
        );
        Ok(())
    }
}
