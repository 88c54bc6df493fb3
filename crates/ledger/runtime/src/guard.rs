//! Operation guard: serializes mutations and rejects re-entry
//!
//! A component holds its guard for the whole of every mutating operation,
//! including calls out to collaborators. Other threads block until the
//! holder finishes; the holding thread itself gets [`LedgerError::Reentrant`]
//! if a collaborator calls back into another mutating operation.

use ledger_types::{LedgerError, LedgerResult};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
pub struct OperationGuard {
    lock: Mutex<()>,
    holder: Mutex<Option<ThreadId>>,
}

/// Proof of exclusive entry. Releases the guard on drop.
#[must_use]
pub struct Entered<'a> {
    holder: &'a Mutex<Option<ThreadId>>,
    _lock: MutexGuard<'a, ()>,
}

impl OperationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> LedgerResult<Entered<'_>> {
        let me = thread::current().id();
        {
            let holder = self.holder.lock().map_err(|_| LedgerError::LockPoisoned)?;
            if *holder == Some(me) {
                return Err(LedgerError::Reentrant);
            }
        }

        // The unit lock carries no data, so a poisoned lock is still usable.
        let lock = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *self.holder.lock().map_err(|_| LedgerError::LockPoisoned)? = Some(me);

        Ok(Entered {
            holder: &self.holder,
            _lock: lock,
        })
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        if let Ok(mut holder) = self.holder.lock() {
            *holder = None;
        }
    }
}
