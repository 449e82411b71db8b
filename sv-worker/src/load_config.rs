/// `load_config` module: reads the static YAML worker config and collects secrets from the environment.
///
/// The YAML file carries only tunables (delays, paths, order radix). Connection
/// strings and API tokens never live in the file; they come from environment
/// variables, optionally via a `.env` file loaded in `main`.
///
/// # Environment
/// - `DATABASE_CONNECTION`: Postgres connection string (required)
/// - `REDIS_ADDRESS`: `host:port` of the page cache (required)
/// - `REDIS_AUTH`: Redis password (optional)
/// - `HEROKU_APP`, `HEROKU_USER`, `HEROKU_TOKEN`: domain registration (required)
///
/// # Errors
/// Everything here returns `anyhow::Error` and is surfaced at the CLI boundary.
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::Path;
use sv_worker_core::config::WorkerConfig;
use tracing::{error, info};

/// Loads the YAML worker config. An empty file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<WorkerConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file empty, using defaults");
        return Ok(WorkerConfig::default());
    }

    match serde_yaml::from_str::<WorkerConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

#[derive(Clone)]
pub struct Secrets {
    pub database_connection: String,
    pub redis_address: String,
    pub redis_auth: Option<String>,
    pub heroku_app: String,
    pub heroku_user: String,
    pub heroku_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("redis_address", &self.redis_address)
            .field("redis_auth_set", &self.redis_auth.is_some())
            .field("heroku_app", &self.heroku_app)
            .field("heroku_user", &self.heroku_user)
            .finish_non_exhaustive()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let secrets = Secrets {
            database_connection: required("DATABASE_CONNECTION")?,
            redis_address: required("REDIS_ADDRESS")?,
            redis_auth: env::var("REDIS_AUTH").ok().filter(|v| !v.is_empty()),
            heroku_app: required("HEROKU_APP")?,
            heroku_user: required("HEROKU_USER")?,
            heroku_token: required("HEROKU_TOKEN")?,
        };
        info!(
            redis_address = %secrets.redis_address,
            redis_auth_set = secrets.redis_auth.is_some(),
            heroku_app = %secrets.heroku_app,
            "Loaded secrets from environment"
        );
        Ok(secrets)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|e| {
        error!(error = ?e, key, "Required variable missing in environment");
        e
    })
    .with_context(|| format!("{key} must be set"))
}
