use clap::Parser;
use momo_ledger::{importer, snapshot};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Parse an MTN Mobile Money SMS backup and write the transaction snapshot
#[derive(Debug, Parser)]
#[command(name = "import-sms", version)]
struct Args {
    /// SMS backup XML document
    xml: PathBuf,

    /// Where to write the JSON snapshot
    #[arg(short, long, default_value = "data/transactions.json")]
    output: PathBuf,

    /// How many records to echo after parsing
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    println!("Starting XML parsing of {}...", args.xml.display());

    let messages = match importer::load_backup(&args.xml) {
        Ok(messages) => messages,
        Err(e) => {
            println!("Error reading {}: {}", args.xml.display(), e);
            return Ok(());
        }
    };

    let outcome = importer::import_messages(&messages);
    let transactions = &outcome.transactions;
    if transactions.is_empty() {
        println!("No transactions found or something went wrong");
        return Ok(());
    }

    snapshot::save(&args.output, transactions)?;

    let preview = args.preview.min(transactions.len());
    println!("\nFirst {} transactions:", preview);
    println!("{}", serde_json::to_string_pretty(&transactions[..preview])?);

    println!("\nTransaction types found:");
    for (kind, count) in importer::type_breakdown(transactions) {
        println!("  {}: {}", kind, count);
    }

    println!("\nSkipped {} messages shorter than {} characters", outcome.skipped, importer::MIN_BODY_LEN);
    if !outcome.dropped.is_empty() {
        println!(
            "Dropped {} messages whose TxId was already used: {}",
            outcome.dropped.len(),
            outcome.dropped.join(", ")
        );
    }

    Ok(())
}
