//! CLI command implementations

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::api::{self, routes::SignUpRequest};
use crate::auth::UserRole;
use crate::cli::{info, success, warn};
use crate::config::{self, Config, StorageBackend};
use crate::storage;

/// Write a default configuration file
pub async fn init(path: &Path) -> Result<()> {
    if path.exists() {
        warn(&format!("{} already exists", path.display()));
        return Ok(());
    }

    config::loader::write_default_config(path)?;

    success(&format!("Created {}", path.display()));
    info("Set ACCESS_TOKEN_SECRET_KEY (and DATABASE_URL), then run 'authkeep migrate' and 'authkeep serve'");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    api::run_server(config, &host, port).await?;
    Ok(())
}

/// Create the database tables
pub async fn migrate(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = connect(&config).await?;

    storage::migrate(&client).await?;
    success("Database schema is up to date");
    Ok(())
}

/// Register an administrator account
pub async fn create_admin(
    config_path: Option<PathBuf>,
    username: &str,
    name: &str,
    age: u8,
    password: &str,
) -> Result<()> {
    let config = load_config(config_path)?;
    if config.storage.backend == StorageBackend::Memory {
        bail!("create-admin needs the postgres backend; in-memory users vanish when this command exits");
    }

    let request = SignUpRequest {
        username: username.to_string(),
        name: name.to_string(),
        age: i64::from(age),
        password: password.to_string(),
    };
    let age = request.validate()?;

    let (auth, purge_task) = api::build_auth(&config).await?;
    purge_task.abort();

    let id = auth
        .register(username, name, age, password, UserRole::Admin)
        .await?;

    success(&format!("Created admin '{}' ({})", username, id));
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => config::load_config_from_path(&path),
        None => config::load_config(),
    };
    config.map_err(|e| anyhow::anyhow!("{}", e))
}

async fn connect(config: &Config) -> Result<std::sync::Arc<tokio_postgres::Client>> {
    let Some(url) = config.database.url.as_deref() else {
        bail!("database.url is not set");
    };
    Ok(storage::connect(url).await?)
}
