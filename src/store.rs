use indexmap::{map::Entry, IndexMap};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::{Transaction, TransactionPayload};
use crate::parser::now_iso;

/// Status given to records created through the API without one
pub const DEFAULT_STATUS: &str = "pending";

const REQUIRED_FIELDS: [&str; 4] = ["type", "amount", "sender", "receiver"];

/// In-memory transaction records, kept in insertion order and keyed by id.
///
/// Both views come from one `IndexMap`, so listing and keyed lookup always
/// see the same records.
#[derive(Debug, Default)]
pub struct TransactionStore {
    records: IndexMap<String, Transaction>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a loaded or imported sequence. Records with an empty or
    /// repeated id are skipped; the first occurrence wins.
    pub fn from_records(records: impl IntoIterator<Item = Transaction>) -> Self {
        let mut store = Self::new();
        for tx in records {
            if tx.id.is_empty() {
                warn!("Skipping record without id: {:?}", tx);
                continue;
            }
            if let Err(e) = store.insert(tx) {
                warn!("Skipping record: {}", e);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order
    pub fn list(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.records.values()
    }

    pub fn get(&self, id: &str) -> Result<&Transaction, StoreError> {
        self.records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Create a record from a client payload.
    ///
    /// `type`, `amount`, `sender` and `receiver` are required. The id is one
    /// above the highest numeric id present, `timestamp` defaults to now and
    /// `status` to "pending".
    pub fn create(&mut self, payload: TransactionPayload) -> Result<Transaction, StoreError> {
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .into_iter()
            .zip([
                payload.kind.is_none(),
                payload.amount.is_none(),
                payload.sender.is_none(),
                payload.receiver.is_none(),
            ])
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();

        let (Some(kind), Some(amount), Some(sender), Some(receiver)) =
            (payload.kind, payload.amount, payload.sender, payload.receiver)
        else {
            return Err(StoreError::MissingFields(missing));
        };
        check_amount(&amount)?;

        let tx = Transaction {
            id: self.next_id()?,
            kind,
            amount,
            sender,
            receiver,
            timestamp: payload.timestamp.unwrap_or_else(now_iso),
            status: payload.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            extra: payload.extra,
        };

        self.insert(tx.clone())?;
        Ok(tx)
    }

    /// Merge payload fields into an existing record. The id never changes;
    /// unknown fields are kept alongside the known ones.
    pub fn update(&mut self, id: &str, payload: TransactionPayload) -> Result<Transaction, StoreError> {
        let tx = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(amount) = &payload.amount {
            check_amount(amount)?;
        }
        if payload.id.is_some() {
            debug!("Ignoring id in update payload for {}", id);
        }

        if let Some(kind) = payload.kind {
            tx.kind = kind;
        }
        if let Some(amount) = payload.amount {
            tx.amount = amount;
        }
        if let Some(sender) = payload.sender {
            tx.sender = sender;
        }
        if let Some(receiver) = payload.receiver {
            tx.receiver = receiver;
        }
        if let Some(timestamp) = payload.timestamp {
            tx.timestamp = timestamp;
        }
        if let Some(status) = payload.status {
            tx.status = status;
        }
        tx.extra.extend(payload.extra);

        Ok(tx.clone())
    }

    pub fn delete(&mut self, id: &str) -> Result<Transaction, StoreError> {
        self.records
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    // Never replaces a record already stored under the same id
    fn insert(&mut self, tx: Transaction) -> Result<(), StoreError> {
        match self.records.entry(tx.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(tx.id)),
            Entry::Vacant(slot) => {
                slot.insert(tx);
                Ok(())
            }
        }
    }

    /// Largest numeric id currently present plus one, or "1" if there is none.
    /// Ids that are not numbers are ignored.
    fn next_id(&self) -> Result<String, StoreError> {
        let max = self
            .records
            .keys()
            .filter_map(|id| id.parse::<u128>().ok())
            .max();

        let next = match max {
            Some(n) => n.checked_add(1).ok_or(StoreError::IdsExhausted)?,
            None => 1,
        };
        Ok(next.to_string())
    }
}

fn check_amount(amount: &rust_decimal::Decimal) -> Result<(), StoreError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(StoreError::Validation("amount must be non-negative".to_string()));
    }
    Ok(())
}
