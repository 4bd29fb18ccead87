// src/models.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of mobile-money movement recognised in an SMS body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Send,
    Receive,
    Deposit,
    Withdraw,
    Airtime,
    Other,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Send => "SEND",
            TransactionType::Receive => "RECEIVE",
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
            TransactionType::Airtime => "AIRTIME",
            TransactionType::Other => "OTHER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transaction record, as stored and as returned by the API.
///
/// Fields outside the well-known set are kept in `extra` and flattened back
/// into the JSON object, so clients can attach their own attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal, // serialized as a JSON number (serde-float)
    pub sender: String,
    pub receiver: String,
    pub timestamp: String, // ISO-8601, local time
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client-supplied body for create and update.
///
/// Every known field is optional; `id` is accepted but never applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPayload {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionType>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One `<sms>` element from the backup document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub body: String,
    pub date: String,          // epoch milliseconds, as text
    pub readable_date: String, // fallback when `date` does not parse
}

impl RawMessage {
    pub fn new(body: impl Into<String>, date: impl Into<String>, readable_date: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            date: date.into(),
            readable_date: readable_date.into(),
        }
    }
}
