use tracing::{error, info};

use arquivista::{Config, Database, FileStore, WebServer};

/// Config file used when `ARQUIVISTA_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    let config_path =
        std::env::var("ARQUIVISTA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = arquivista::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        arquivista::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> arquivista::Result<()> {
    info!("Arquivista - personal file organizer");

    let db = Database::open(&config.database.path).await?;
    let store = FileStore::from_config(&config.files)?;
    info!(
        upload_root = %store.upload_root().display(),
        require_login = config.auth.require_login,
        "File store ready"
    );

    let server = WebServer::new(&config, db, store)?;
    server.run().await?;
    Ok(())
}
