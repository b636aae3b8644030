//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Generation concurrency and timeout configuration
    pub generation: GenerationConfig,
    /// Result cache configuration
    pub cache: CacheConfig,
    /// LLM backend configuration
    pub backend: BackendConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Generation concurrency and timeout configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Maximum number of pipeline runs allowed past the admission gate
    pub max_concurrent_generations: usize,
    /// Per-stage backend call timeout (in seconds)
    pub llm_request_timeout_secs: u64,
}

/// Result cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether the full-deck result cache is enabled
    pub enabled: bool,
    /// Time-to-live for cached decks (in seconds)
    pub ttl_secs: u64,
    /// Maximum number of cached decks before FIFO eviction
    pub max_size: usize,
}

/// LLM backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API key for the completion endpoint
    pub api_key: String,
    /// Model name to request
    pub model: String,
    /// Base URL of the OpenAI-compatible completion API
    pub base_url: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            generation: GenerationConfig {
                max_concurrent_generations: env::var("MAX_CONCURRENT_GENERATIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(10),
                llm_request_timeout_secs: env::var("LLM_REQUEST_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(60),
            },
            cache: CacheConfig {
                enabled: env::var("CACHE_ENABLED")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(true),
                ttl_secs: env::var("CACHE_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
                max_size: env::var("CACHE_MAX_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(100),
            },
            backend: BackendConfig {
                api_key: env::var("LLM_API_KEY").unwrap_or_default(),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "PORT",
            "HOST",
            "MAX_CONCURRENT_GENERATIONS",
            "LLM_REQUEST_TIMEOUT_SECONDS",
            "CACHE_ENABLED",
            "CACHE_TTL_SECONDS",
            "CACHE_MAX_SIZE",
            "LLM_API_KEY",
            "LLM_MODEL",
            "LLM_BASE_URL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.generation.max_concurrent_generations, 10);
        assert_eq!(config.generation.llm_request_timeout_secs, 60);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.cache.max_size, 100);
        assert_eq!(config.backend.model, "gpt-4o-mini");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("MAX_CONCURRENT_GENERATIONS", "4");
        env::set_var("LLM_REQUEST_TIMEOUT_SECONDS", "15");
        env::set_var("CACHE_ENABLED", "false");
        env::set_var("CACHE_MAX_SIZE", "5");

        let config = Config::from_env();
        assert_eq!(config.generation.max_concurrent_generations, 4);
        assert_eq!(config.generation.llm_request_timeout_secs, 15);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_size, 5);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_concurrency_falls_back_to_default() {
        clear_env();
        env::set_var("MAX_CONCURRENT_GENERATIONS", "0");

        let config = Config::from_env();
        assert_eq!(config.generation.max_concurrent_generations, 10);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_server_addr_format() {
        clear_env();
        env::set_var("HOST", "127.0.0.1");
        env::set_var("PORT", "3000");

        let config = Config::from_env();
        assert_eq!(config.server_addr(), "127.0.0.1:3000");

        clear_env();
    }
}
