/// `load_config` module: loads the optional YAML settings file and resolves secrets.
///
/// The YAML file only holds non-secret settings (endpoints, model, batching).
/// Tokens come from command-line flags or environment variables and are never
/// read from the file.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use figma_rag_core::config::Config;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const FIGMA_TOKEN_ENV: &str = "FIGMA_ACCESS_TOKEN";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Loads a YAML settings file. Missing sections and fields take their defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // an empty file is a valid, all-defaults config
    if config_content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.trace_loaded();
    Ok(config)
}

/// Returns the flag value if given, otherwise the environment variable.
pub fn resolve_secret(flag: Option<String>, env_var: &str) -> Option<String> {
    if let Some(value) = flag.filter(|v| !v.trim().is_empty()) {
        info!(source = "flag", env_var, "Secret resolved");
        return Some(value);
    }
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => {
            info!(source = "env", env_var, "Secret resolved");
            Some(value)
        }
        _ => {
            error!(env_var, "Secret not provided by flag or environment");
            None
        }
    }
}
