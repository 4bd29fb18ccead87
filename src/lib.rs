pub mod api;
pub mod config;
pub mod error;
pub mod importer;
pub mod models;
pub mod parser;
pub mod snapshot;
pub mod store;
