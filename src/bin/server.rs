use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use portfolio_auth::config::ServiceConfig;
use portfolio_auth::handlers::{auth_routes, HandlerOptions};
use portfolio_auth::storage::{CredentialStore, MemoryCredentialStore};
use portfolio_auth::CredentialService;

#[tokio::main]
async fn main() {
    // Initialize env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration: {:?}", config);
    if config.development_mode {
        warn!("Development mode is enabled: account names will appear in security logs");
    }

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());

    let service = match CredentialService::from_config(&config, store) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to initialize credential service: {}", e);
            std::process::exit(1);
        }
    };
    service.security_logger().start_cleanup_task();

    // Create the bootstrap admin account
    match &config.admin_password {
        Some(password) => match service.ensure_account(&config.admin_username, password).await {
            Ok(true) => info!("Bootstrap admin account created"),
            Ok(false) => info!("Bootstrap admin account already exists"),
            Err(e) => {
                error!("Failed to create bootstrap admin account: {}", e);
                std::process::exit(1);
            }
        },
        None => warn!("No admin password configured; no account will be able to log in"),
    }

    let routes = auth_routes(
        service,
        HandlerOptions {
            auth_min_duration: config.auth_min_duration,
            allow_registration: config.allow_registration,
        },
    );

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting portfolio auth server on {}", addr);

    warp::serve(routes).run(addr).await;
}
