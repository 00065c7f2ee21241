use clap::Parser;
use log::{error, info};
use newsboard::config::{Config, StorageBackend};
use newsboard::storage::db_store::DbStore;
use newsboard::storage::file_store::FileStore;
use newsboard::storage::store::StoryStore;
use newsboard::web::server::WebServer;
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "newsboard")]
#[command(version = "0.1.0")]
#[command(about = "A social news story board REST API")]
struct Args {
    /// Path to the TOML configuration file
    config_file: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    info!("Importing configuration");
    let config = match Config::from_file(Path::new(args.config_file.as_str())) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration from file: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration imported successfully");

    let store: Arc<dyn StoryStore> = match config.storage.backend {
        StorageBackend::File => match FileStore::new(&config.storage.path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Unable to open file store: {}", e);
                std::process::exit(1);
            }
        },
        StorageBackend::Sqlite => match DbStore::connect(&config.storage.path).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Unable to open database store: {}", e);
                std::process::exit(1);
            }
        },
    };

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address: {}", e);
            std::process::exit(1);
        }
    };

    WebServer::new(store).start(addr).await;
}
