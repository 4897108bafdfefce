use sealed_users::core::config::{config_path_from_args, Config};
use sealed_users::core::startup::open_users;
use sealed_users::core::tracing_init::init_tracing;
use sealed_users::db::provider::ConnectionProvider;
use sealed_users::seed::run_seed;
use std::env;
use std::process;
use tracing::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();
    let config_path = config_path_from_args(&args);

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from '{}': {:#}", config_path.display(), e);
            process::exit(1);
        }
    };

    init_tracing(&config);

    let provider = ConnectionProvider::new(config.database.clone(), config.app.mode);

    let result = open_users(&config, &provider)
        .and_then(|(_, users)| run_seed(&users).map_err(anyhow::Error::from));

    match result {
        Ok(created) => {
            info!(created, "Seed process finished");
            println!("Seed process finished.");
        }
        Err(e) => {
            let message = format!("{:#}", e);
            error!(error = %message, "Seed process failed");
            eprintln!("Seed process failed: {}", message);
            process::exit(1);
        }
    }
}
