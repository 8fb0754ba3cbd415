use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub captcha: CaptchaConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub base_path: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub audit_backend: String, // "memory" or "sled"
    pub audit_path: String,
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    pub length: usize,
    pub ttl_secs: u64,
    pub verify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub max_owner_fragment_len: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1:5000".to_string(),
                base_path: "/api".to_string(),
                request_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            storage: StorageConfig {
                audit_backend: "memory".to_string(),
                audit_path: "./data/audit".to_string(),
                seed_file: None,
            },
            captcha: CaptchaConfig {
                length: 5,
                ttl_secs: 300,
                verify: false,
            },
            search: SearchConfig {
                max_owner_fragment_len: 100,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix, e.g. LAND_RECORDS__SERVER__BIND_ADDRESS
            .add_source(
                Environment::with_prefix("LAND_RECORDS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "Invalid bind_address: {}",
                self.server.bind_address
            ));
        }
        if !self.server.base_path.is_empty() && !self.server.base_path.starts_with('/') {
            return Err(anyhow::anyhow!("base_path must start with '/'"));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate storage config
        let valid_backends = ["memory", "sled"];
        if !valid_backends.contains(&self.storage.audit_backend.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid audit backend: {}. Must be one of: {:?}",
                self.storage.audit_backend,
                valid_backends
            ));
        }
        if self.storage.audit_backend == "sled" && self.storage.audit_path.trim().is_empty() {
            return Err(anyhow::anyhow!("audit_path is required for the sled backend"));
        }

        // Validate captcha config
        if !(4..=12).contains(&self.captcha.length) {
            return Err(anyhow::anyhow!("captcha length must be between 4 and 12"));
        }
        if self.captcha.ttl_secs == 0 {
            return Err(anyhow::anyhow!("captcha ttl_secs must be greater than 0"));
        }

        // Validate search config
        if self.search.max_owner_fragment_len == 0 {
            return Err(anyhow::anyhow!("max_owner_fragment_len must be greater than 0"));
        }

        Ok(())
    }

    /// Get bind address from environment or config
    pub fn get_bind_address(&self) -> Result<SocketAddr> {
        let raw = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| self.server.bind_address.clone());
        raw.parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", raw, e))
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
