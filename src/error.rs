use thiserror::Error;

/// Failures surfaced by the transaction store
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Transaction {0} not found")]
    NotFound(String),

    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    Validation(String),

    #[error("Transaction id {0} is already in use")]
    DuplicateId(String),

    #[error("No transaction ids left to allocate")]
    IdsExhausted,
}

/// Failures reading an SMS backup document
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed backup document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed sms attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("backup document has no root element")]
    NoRoot,

    #[error("backup document ends with {0} unclosed element(s)")]
    Unclosed(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures loading or saving the JSON snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not a valid transaction array: {0}")]
    Json(#[from] serde_json::Error),
}
