//! Event sinks
//!
//! Components publish through an injected [`EventSink`]. Fan-out to
//! subscribers is the embedder's concern; [`EventJournal`] keeps an
//! append-only in-memory record.

use ledger_types::{Address, EventRecord, LedgerEvent, Timestamp};
use std::sync::Mutex;

pub trait EventSink: Send + Sync {
    fn emit(&self, emitted_at: Timestamp, event: LedgerEvent);
}

/// Emit a mutation's events in order, then the `StateChanged` record for
/// the first (primary) one.
pub(crate) fn publish(
    sink: &dyn EventSink,
    now: Timestamp,
    entity_id: impl Into<String>,
    operator: &Address,
    events: Vec<LedgerEvent>,
) {
    let state_changed = events
        .first()
        .map(|primary| LedgerEvent::state_changed(entity_id, primary, operator.clone(), now));
    for event in events {
        sink.emit(now, event);
    }
    if let Some(record) = state_changed {
        sink.emit(now, record);
    }
}

/// Append-only in-memory event record
#[derive(Debug, Default)]
pub struct EventJournal {
    records: Mutex<Vec<EventRecord>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn records_guard(&self) -> std::sync::MutexGuard<'_, Vec<EventRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records_guard().clone()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.records_guard()
            .iter()
            .map(|r| r.event.clone())
            .collect()
    }

    /// Events whose [`LedgerEvent::name`] equals `name`.
    pub fn events_named(&self, name: &str) -> Vec<LedgerEvent> {
        self.records_guard()
            .iter()
            .filter(|r| r.event.name() == name)
            .map(|r| r.event.clone())
            .collect()
    }

    /// Records with `sequence >= from`.
    pub fn since(&self, from: u64) -> Vec<EventRecord> {
        self.records_guard()
            .iter()
            .filter(|r| r.sequence >= from)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records_guard().is_empty()
    }
}

impl EventSink for EventJournal {
    fn emit(&self, emitted_at: Timestamp, event: LedgerEvent) {
        let mut records = self.records_guard();
        let sequence = records.len() as u64;
        records.push(EventRecord::new(sequence, emitted_at, event));
    }
}
