use crate::batch::BatchConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Non-secret settings. Every section and field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub figma: FigmaSettings,
    pub llm: LlmSettings,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            figma_base_url = %self.figma.base_url,
            model = %self.llm.model,
            batch_size = self.llm.batch_size,
            retry_attempts = self.llm.retry_attempts,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigmaSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for FigmaSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.figma.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl FigmaSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub batch_size: usize,
    pub retry_attempts: u32,
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub retry_delay_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            batch_size: 5,
            retry_attempts: 3,
            concurrency: 1,
            request_timeout_secs: 60,
            retry_delay_ms: 1000,
        }
    }
}

impl LlmSettings {
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            batch_size: self.batch_size,
            retry_attempts: self.retry_attempts,
            concurrency: self.concurrency,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}
