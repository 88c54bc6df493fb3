//! Recurring scheduled payments
//!
//! A scheduled payment is an obligation, not a timer: it becomes due at
//! `next_payment_time` and advances only when someone executes it.

use crate::{Address, Amount, PaymentId, Project, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub id: PaymentId,
    /// Project whose custody balance funds the payment
    pub project: Project,
    pub recipient: Address,
    pub token: TokenId,
    pub amount: Amount,
    /// Seconds between occurrences
    pub frequency: u64,
    pub next_payment_time: Timestamp,
    pub total_payments: u32,
    pub remaining_payments: u32,
    pub creator: Address,
    pub active: bool,
    pub created_at: Timestamp,
}

impl ScheduledPayment {
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.active && self.remaining_payments > 0 && now >= self.next_payment_time
    }

    /// Occurrences already paid out.
    pub fn payments_made(&self) -> u32 {
        self.total_payments.saturating_sub(self.remaining_payments)
    }

    /// Consume one occurrence. Deactivates permanently at zero.
    pub fn advance(&mut self) {
        self.next_payment_time = self.next_payment_time.saturating_add(self.frequency);
        self.remaining_payments = self.remaining_payments.saturating_sub(1);
        if self.remaining_payments == 0 {
            self.active = false;
        }
    }

    /// Undo one [`advance`](Self::advance).
    pub fn rewind(&mut self) {
        self.next_payment_time = self.next_payment_time.saturating_sub(self.frequency);
        self.remaining_payments = self.remaining_payments.saturating_add(1);
        self.active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment() -> ScheduledPayment {
        ScheduledPayment {
            id: PaymentId(0),
            project: Project::Protocol,
            recipient: Address::new("contractor"),
            token: TokenId::new("USDC"),
            amount: Amount::new(100),
            frequency: 86_400,
            next_payment_time: 86_400,
            total_payments: 2,
            remaining_payments: 2,
            creator: Address::new("owner"),
            active: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_due() {
        let p = payment();
        assert!(!p.is_due(86_399));
        assert!(p.is_due(86_400));
    }

    #[test]
    fn test_advance_until_exhausted() {
        let mut p = payment();
        p.advance();
        assert_eq!(p.remaining_payments, 1);
        assert_eq!(p.next_payment_time, 172_800);
        assert!(p.active);
        assert_eq!(p.payments_made(), 1);

        p.advance();
        assert_eq!(p.remaining_payments, 0);
        assert!(!p.active);
        assert!(!p.is_due(u64::MAX));
    }

    #[test]
    fn test_rewind_restores() {
        let mut p = payment();
        p.advance();
        p.advance();
        p.rewind();
        assert_eq!(p.remaining_payments, 1);
        assert_eq!(p.next_payment_time, 172_800);
        assert!(p.active);
    }
}
