use clap::Parser;
use momo_ledger::{models::Transaction, snapshot, store::TransactionStore};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Compare a linear scan over the record list with keyed lookup
#[derive(Debug, Parser)]
#[command(name = "lookup-bench")]
struct Args {
    /// JSON snapshot to load
    #[arg(default_value = "data/transactions.json")]
    snapshot: PathBuf,

    /// Ids to search for (default: up to 20 ids spread over the snapshot)
    #[arg(long, value_delimiter = ',')]
    ids: Vec<String>,

    /// Times each id is searched
    #[arg(long, default_value_t = 1000)]
    rounds: u32,
}

fn linear_search<'a>(store: &'a TransactionStore, id: &str) -> Option<&'a Transaction> {
    store.list().find(|tx| tx.id == id)
}

fn time<F: FnMut() -> usize>(rounds: u32, mut f: F) -> (Duration, usize) {
    let start = Instant::now();
    let mut hits = 0;
    for _ in 0..rounds {
        hits = f();
    }
    (start.elapsed(), hits)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let store = TransactionStore::from_records(snapshot::load(&args.snapshot)?);
    if store.is_empty() {
        println!("No transactions in {}", args.snapshot.display());
        return Ok(());
    }

    let ids: Vec<String> = if args.ids.is_empty() {
        let step = (store.len() / 20).max(1);
        store.list().step_by(step).take(20).map(|tx| tx.id.clone()).collect()
    } else {
        args.ids
    };

    println!("Testing with {} searches over {} records...", ids.len(), store.len());

    let (linear, linear_hits) = time(args.rounds, || {
        ids.iter().filter(|id| linear_search(&store, id).is_some()).count()
    });
    let (keyed, keyed_hits) = time(args.rounds, || {
        ids.iter().filter(|id| store.get(id).is_ok()).count()
    });

    println!("Linear search:    {:?} ({} found)", linear, linear_hits);
    println!("Dictionary lookup: {:?} ({} found)", keyed, keyed_hits);
    if !keyed.is_zero() {
        println!(
            "Dictionary lookup is {:.1}x faster",
            linear.as_secs_f64() / keyed.as_secs_f64()
        );
    }

    Ok(())
}
