// src/parser.rs
use chrono::{Local, NaiveDateTime, TimeZone, Timelike};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Map;
use std::str::FromStr;

use crate::models::{Transaction, TransactionType};

/// Status given to every record recovered from the SMS backup
pub const IMPORTED_STATUS: &str = "completed";

lazy_static! {
    static ref TX_ID: Regex = Regex::new(r"TxId[:\s]+(\d+)").unwrap();
    static ref AMOUNT: Regex = Regex::new(r"(\d{1,3}(?:,\d{3})*|\d+)\s*RWF").unwrap();
    static ref SENDER: Regex = Regex::new(r"(?i)from ([A-Za-z\s]+)").unwrap();
    static ref PAYMENT_RECEIVER: Regex = Regex::new(r"(?i)to ([A-Za-z\s]+\d+)").unwrap();
    static ref TRANSFER_RECEIVER: Regex =
        Regex::new(r"(?i)to ([A-Za-z\s]+)\s*\((\d+)\)").unwrap();
}

/// Outcome of a classification rule: the type and the two parties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: TransactionType,
    pub sender: String,
    pub receiver: String,
}

impl Classification {
    fn new(kind: TransactionType, sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            kind,
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }
}

/// A rule sees the original body and its lowercase form
type Rule = fn(&str, &str) -> Option<Classification>;

/// Evaluated in order; the first rule that returns `Some` wins.
pub const RULES: [Rule; 6] = [
    receive_rule,
    payment_rule,
    transfer_rule,
    deposit_rule,
    airtime_rule,
    withdraw_rule,
];

// NOTE: `from && !to` is a plain substring test, so words like "total" count as "to".
pub fn receive_rule(body: &str, lower: &str) -> Option<Classification> {
    if !(lower.contains("received") || (lower.contains("from") && !lower.contains("to"))) {
        return None;
    }
    let sender = capture(&SENDER, body).unwrap_or_default();
    Some(Classification::new(TransactionType::Receive, sender, "You"))
}

pub fn payment_rule(body: &str, lower: &str) -> Option<Classification> {
    if !(lower.contains("payment") && lower.contains("to")) {
        return None;
    }
    let receiver = capture(&PAYMENT_RECEIVER, body).unwrap_or_default();
    Some(Classification::new(TransactionType::Send, "You", receiver))
}

pub fn transfer_rule(body: &str, lower: &str) -> Option<Classification> {
    if !lower.contains("transferred to") {
        return None;
    }
    let receiver = TRANSFER_RECEIVER
        .captures(body)
        .map(|c| format!("{} ({})", c[1].trim(), &c[2]))
        .unwrap_or_default();
    Some(Classification::new(TransactionType::Send, "You", receiver))
}

pub fn deposit_rule(_body: &str, lower: &str) -> Option<Classification> {
    // "cash deposit" is covered by "deposit"
    lower
        .contains("deposit")
        .then(|| Classification::new(TransactionType::Deposit, "Bank/Agent", "You"))
}

pub fn airtime_rule(_body: &str, lower: &str) -> Option<Classification> {
    lower
        .contains("airtime")
        .then(|| Classification::new(TransactionType::Airtime, "You", "Airtime"))
}

pub fn withdraw_rule(_body: &str, lower: &str) -> Option<Classification> {
    // "withdrawal" contains "withdraw"
    lower
        .contains("withdraw")
        .then(|| Classification::new(TransactionType::Withdraw, "You", "Agent"))
}

/// Run the rule table; falls back to OTHER with unknown parties.
pub fn classify(body: &str) -> Classification {
    let lower = body.to_lowercase();
    RULES
        .iter()
        .find_map(|rule| rule(body, &lower))
        .unwrap_or_else(|| Classification::new(TransactionType::Other, "Unknown", "Unknown"))
}

/// Transaction id printed after a "TxId" marker, if any
pub fn extract_tx_id(body: &str) -> Option<String> {
    TX_ID.captures(body).map(|c| c[1].to_string())
}

/// First quantity followed by "RWF", thousands separators removed; zero if absent
pub fn extract_amount(body: &str) -> Decimal {
    AMOUNT
        .captures(body)
        .and_then(|c| Decimal::from_str(&c[1].replace(',', "")).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Decode one SMS body into a transaction record.
///
/// The returned `id` is empty when the body carries no transaction id; the
/// importer assigns a fallback in that case. Pattern misses never fail, they
/// degrade to the documented defaults.
pub fn extract(body: &str, timestamp: &str) -> Transaction {
    let Classification { kind, sender, receiver } = classify(body);

    Transaction {
        id: extract_tx_id(body).unwrap_or_default(),
        kind,
        amount: extract_amount(body),
        sender,
        receiver,
        timestamp: timestamp.to_string(),
        status: IMPORTED_STATUS.to_string(),
        extra: Map::new(),
    }
}

/// Convert an epoch-millisecond string to ISO-8601 local time, or return
/// `readable_date` when the number is missing or out of range.
pub fn convert_timestamp(date_ms: &str, readable_date: &str) -> String {
    convert_timestamp_in(&Local, date_ms, readable_date)
}

pub fn convert_timestamp_in<Tz: TimeZone>(tz: &Tz, date_ms: &str, readable_date: &str) -> String {
    date_ms
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|ms| tz.timestamp_millis_opt(ms).earliest())
        .map(|dt| format_iso(&dt.naive_local()))
        .unwrap_or_else(|| readable_date.to_string())
}

/// Current local time in the same format imported records use
pub fn now_iso() -> String {
    format_iso(&Local::now().naive_local())
}

// Fraction printed as microseconds, and only when non-zero
fn format_iso(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

fn capture(re: &Regex, body: &str) -> Option<String> {
    re.captures(body).map(|c| c[1].trim().to_string())
}
