//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::Config;

pub const CONFIG_FILENAME: &str = "authkeep.toml";

/// Load configuration from authkeep.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::Config(format!(
                "{} not found. Run 'authkeep init' first.",
                CONFIG_FILENAME
            )));
        }
    }
}

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").expect("valid env var pattern")
});

/// Expand `${VAR}` and `${VAR:-default}`; unset variables without a default become empty
fn interpolate_env_vars(content: &str) -> String {
    ENV_VAR.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Write the default configuration file, refusing to overwrite an existing one
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::Config(format!("{} already exists", path.display())));
    }
    fs::write(path, default_config_content())?;
    Ok(())
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# authkeep configuration

[server]
host = "0.0.0.0"
port = 8080

[database]
url = "${DATABASE_URL:-host=localhost user=postgres password=postgres dbname=authkeep}"

[tokens]
secret_key = "${ACCESS_TOKEN_SECRET_KEY}"
access_token_ttl_secs = 900        # 15 minutes
refresh_token_ttl_secs = 2592000   # 30 days
refresh_token_bytes = 32

[hash]
cost = 12

[storage]
backend = "postgres"  # or "memory" for a throwaway instance
timeout_ms = 5000
purge_interval_secs = 300
"#
}
