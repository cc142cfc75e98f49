use crate::models::gateway::GatewayConfig;
use log::debug;
use std::fs;
use std::path::Path;

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "GUARDIAN_CONFIG_PATH";

/// Upper bound on config file size, guards against reading the wrong file.
const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

/// Loads the gateway configuration from a YAML file.
///
/// Unknown keys are ignored and missing sections default to disabled, so a
/// minimal file containing only `general:` is valid.
pub fn load_config(config_path: &str) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    debug!("Loading configuration from: {}", config_path);

    let path = Path::new(config_path);
    if !path.exists() {
        return Err(format!("Config file '{}' not found", config_path).into());
    }

    let metadata = fs::metadata(path)
        .map_err(|e| format!("Cannot read config file metadata: {}", e))?;
    if metadata.len() > MAX_CONFIG_SIZE {
        return Err(format!(
            "Config file too large: {} bytes (max: {} bytes)",
            metadata.len(),
            MAX_CONFIG_SIZE
        )
        .into());
    }

    let config_data = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file '{}': {}", config_path, e))?;

    let config: GatewayConfig =
        serde_yaml::from_str(&config_data).map_err(|e| format!("Invalid YAML: {}", e))?;

    debug!(
        "Loaded configuration for '{}' v{}",
        config.general.gateway_name, config.general.version
    );

    Ok(config)
}

/// Loads the configuration from `GUARDIAN_CONFIG_PATH`, defaulting to
/// `./config.yaml`.
pub fn load_config_from_env() -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string());
    load_config(&config_path)
}
