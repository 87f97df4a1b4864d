use std::sync::Arc;

use backup_api::{
    api::{start_api_server, ApiState},
    auth::build_token_service,
    observability::{init_logging, log_config_info},
    storage::{check_connection, create_pool, SqlxUserRepository},
    AppConfig, Result, APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists; must happen before any config is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env()?;
    init_logging(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting backup API");
    log_config_info(&config);

    let tokens = build_token_service(&config.token).inspect_err(|e| {
        error!(error = %e, "Failed to initialize token service");
    })?;

    let pool = create_pool(&config.database).await?;
    check_connection(&pool).await?;
    let users = Arc::new(SqlxUserRepository::new(pool));

    let state = ApiState::new(tokens, users);
    if let Err(e) = start_api_server(&config.server, state).await {
        error!(error = %e, "API server terminated with error");
        return Err(e);
    }

    Ok(())
}
