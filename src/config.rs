use dotenvy::dotenv;
use eyre::Result;
use std::{collections::HashMap, env, fmt, path::PathBuf};
use tracing::info;

const DEFAULT_USERS: &str = "admin:password123,user:userpass";

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,              // JSON snapshot loaded at startup
    pub sms_backup_path: Option<PathBuf>, // imported when the snapshot is missing
    pub users: HashMap<String, String>,  // basic-auth name → password
}

// Hand-written so passwords never reach the logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut users: Vec<&String> = self.users.keys().collect();
        users.sort();
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("data_path", &self.data_path)
            .field("sms_backup_path", &self.sms_backup_path)
            .field("users", &users)
            .finish()
    }
}

pub fn load() -> Result<Config> {
    dotenv().ok(); // load from .env file if present

    // API port (default: 8000)
    let port = env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .unwrap_or(8000);

    // snapshot path (default: data/transactions.json)
    let data_path = env::var("DATA_PATH")
        .unwrap_or_else(|_| "data/transactions.json".to_string())
        .into();

    let sms_backup_path = env::var("SMS_BACKUP_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let users = parse_users(&env::var("API_USERS").unwrap_or_else(|_| DEFAULT_USERS.to_string()));

    let cfg = Config {
        port,
        data_path,
        sms_backup_path,
        users,
    };

    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}

/// Parse `name:password` pairs separated by commas; malformed pairs are dropped.
pub fn parse_users(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.trim().split_once(':'))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, password)| (name.to_string(), password.to_string()))
        .collect()
}
