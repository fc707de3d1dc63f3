// Configuration for the server, read from the environment

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub model_id: String,
    pub preload: bool,
    pub model_map_path: String,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8520,
            model_id: tts_core::DEFAULT_MODEL_ID.to_string(),
            preload: true,
            model_map_path: "models/map.json".to_string(),
            request_timeout_secs: 300,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source; unset or unparsable
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("QWEN_TTS_API_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let model_id = lookup("QWEN_TTS_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.model_id);

        // only the literal "1" turns preloading on
        let preload = lookup("QWEN_TTS_PRELOAD")
            .map(|v| v == "1")
            .unwrap_or(defaults.preload);

        let model_map_path = lookup("QWEN_TTS_MODEL_MAP").unwrap_or(defaults.model_map_path);

        let request_timeout_secs = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Self {
            port,
            model_id,
            preload,
            model_map_path,
            request_timeout_secs,
            cors_allowed_origins,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
