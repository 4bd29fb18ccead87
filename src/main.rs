use momo_ledger::{api, config, importer, snapshot, store::TransactionStore};
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // RUST_LOG wins; otherwise show everything down to DEBUG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Mobile Money SMS Transaction API starting...");

    let cfg = config::load()?;

    // Snapshot first; fall back to importing the raw backup
    let records = if snapshot::exists(&cfg.data_path) {
        snapshot::load(&cfg.data_path)?
    } else if let Some(backup) = &cfg.sms_backup_path {
        info!("No snapshot at {}, importing {}", cfg.data_path.display(), backup.display());
        importer::import_file(backup)
    } else {
        warn!(
            "No snapshot at {}; run import-sms first to generate the data",
            cfg.data_path.display()
        );
        Vec::new()
    };

    let store = TransactionStore::from_records(records);
    info!("Loaded {} transactions", store.len());
    let store = Arc::new(Mutex::new(store));

    let api_handle = tokio::spawn({
        let cfg = cfg.clone();
        let store = Arc::clone(&store);
        async move { api::serve(cfg, store).await }
    });

    tokio::select! {
        res = api_handle => match res {
            Ok(Ok(_)) => info!("API exited cleanly"),
            Ok(Err(e)) => error!("API error: {:?}", e),
            Err(e) => error!("API task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Mobile Money SMS Transaction API stopped.");
    Ok(())
}
