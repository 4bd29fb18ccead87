use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::error::ImportError;
use crate::models::{RawMessage, Transaction, TransactionType};
use crate::parser;

/// Bodies shorter than this (in characters) are treated as noise
pub const MIN_BODY_LEN: usize = 10;

/// Read the `<sms>` children of the backup document's root element.
pub fn parse_backup(xml: &str) -> Result<Vec<RawMessage>, ImportError> {
    let mut reader = Reader::from_str(xml);
    let mut messages = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 1 && e.name().as_ref() == b"sms" {
                    messages.push(read_sms(&e)?);
                }
                depth += 1;
                saw_root = true;
            }
            Event::Empty(e) => {
                if depth == 1 && e.name().as_ref() == b"sms" {
                    messages.push(read_sms(&e)?);
                }
                saw_root = true;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ImportError::NoRoot);
    }
    if depth != 0 {
        return Err(ImportError::Unclosed(depth));
    }
    Ok(messages)
}

fn read_sms(e: &BytesStart<'_>) -> Result<RawMessage, ImportError> {
    let mut msg = RawMessage::new("", "0", "");
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"body" => msg.body = value,
            b"date" => msg.date = value,
            b"readable_date" => msg.readable_date = value,
            _ => {}
        }
    }
    Ok(msg)
}

/// Records produced from one batch, plus what was left out and why
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub transactions: Vec<Transaction>,
    pub skipped: usize,       // bodies too short to be transactions
    pub dropped: Vec<String>, // TxIds already taken by an earlier message
}

/// Run the extractor over every usable message, in order.
pub fn import_all(messages: &[RawMessage]) -> Vec<Transaction> {
    import_messages(messages).transactions
}

/// Like [`import_all`], but reports skipped and dropped messages.
///
/// Messages without a "TxId" get a fallback id: the message's position among
/// processed messages, bumped past any id already taken so that fallback ids
/// never collide with an id recovered from any message in the batch. A
/// recovered id that repeats an earlier one is dropped and listed in
/// `dropped`.
pub fn import_messages(messages: &[RawMessage]) -> ImportOutcome {
    let text_ids: HashSet<String> = messages
        .iter()
        .filter(|m| !is_noise(&m.body))
        .filter_map(|m| parser::extract_tx_id(&m.body))
        .collect();

    let mut outcome = ImportOutcome {
        transactions: Vec::with_capacity(messages.len()),
        ..Default::default()
    };
    let mut seen: HashSet<String> = HashSet::new();
    let mut position: u64 = 0;
    let mut last_fallback: u64 = 0;

    for msg in messages {
        if is_noise(&msg.body) {
            outcome.skipped += 1;
            continue;
        }
        position += 1;

        let timestamp = parser::convert_timestamp(&msg.date, &msg.readable_date);
        let mut tx = parser::extract(&msg.body, &timestamp);

        if tx.id.is_empty() {
            let mut candidate = position.max(last_fallback + 1);
            while text_ids.contains(&candidate.to_string()) {
                candidate += 1;
            }
            last_fallback = candidate;
            tx.id = candidate.to_string();
        } else if seen.contains(&tx.id) {
            warn!("Dropping message with repeated TxId {}", tx.id);
            outcome.dropped.push(tx.id);
            continue;
        }

        debug!("Extracted {} {} {} → {}", tx.id, tx.kind, tx.sender, tx.receiver);
        seen.insert(tx.id.clone());
        outcome.transactions.push(tx);
    }

    info!(
        "Imported {} transactions ({} messages skipped as noise, {} repeated TxIds dropped)",
        outcome.transactions.len(),
        outcome.skipped,
        outcome.dropped.len()
    );
    outcome
}

/// Read and parse a backup document from disk
pub fn load_backup(path: impl AsRef<Path>) -> Result<Vec<RawMessage>, ImportError> {
    let xml = std::fs::read_to_string(path)?;
    parse_backup(&xml)
}

/// Parse and import a whole document; a malformed document yields nothing.
pub fn import_document(xml: &str) -> Vec<Transaction> {
    import_or_empty(parse_backup(xml))
}

pub fn import_file(path: impl AsRef<Path>) -> Vec<Transaction> {
    let path = path.as_ref();
    info!("Parsing SMS backup {}", path.display());
    import_or_empty(load_backup(path))
}

fn import_or_empty(parsed: Result<Vec<RawMessage>, ImportError>) -> Vec<Transaction> {
    match parsed {
        Ok(messages) => {
            info!("Found {} SMS records", messages.len());
            import_all(&messages)
        }
        Err(e) => {
            error!("Error reading SMS backup: {}", e);
            Vec::new()
        }
    }
}

/// Count of records per type, in order of first appearance
pub fn type_breakdown(transactions: &[Transaction]) -> IndexMap<TransactionType, usize> {
    let mut counts = IndexMap::new();
    for tx in transactions {
        *counts.entry(tx.kind).or_insert(0) += 1;
    }
    counts
}

fn is_noise(body: &str) -> bool {
    body.chars().count() < MIN_BODY_LEN
}
