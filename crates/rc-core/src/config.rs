//! Configuration types and loading

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// File storage configuration
    pub storage: StorageConfig,

    /// Archive import behaviour
    pub import: ImportConfig,

    /// Archive export behaviour
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Local file storage path
    pub local_path: String,
    /// Base URL under which stored files are served
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: "/var/reportcreator/files".to_string(),
            base_url: "/files".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Run extracted images through the image processor before storing them
    pub compress_images: bool,
    /// Largest file accepted from an archive
    pub max_file_size_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            compress_images: true,
            max_file_size_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// gzip level (0-9) of written archives
    pub compression_level: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl AppConfig {
    /// Load `.env` (if present) and then the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("REPORTCREATOR_STORAGE_PATH") {
            config.storage.local_path = path;
        }
        if let Ok(url) = std::env::var("REPORTCREATOR_STORAGE_BASE_URL") {
            config.storage.base_url = url;
        }

        if let Ok(value) = std::env::var("REPORTCREATOR_COMPRESS_IMAGES") {
            config.import.compress_images = parse_bool("REPORTCREATOR_COMPRESS_IMAGES", &value)?;
        }
        if let Ok(value) = std::env::var("REPORTCREATOR_MAX_FILE_SIZE") {
            config.import.max_file_size_bytes =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "REPORTCREATOR_MAX_FILE_SIZE".to_string(),
                    message: format!("expected a byte count, got {:?}", value),
                })?;
        }

        if let Ok(value) = std::env::var("REPORTCREATOR_EXPORT_COMPRESSION") {
            let level: u32 = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "REPORTCREATOR_EXPORT_COMPRESSION".to_string(),
                message: format!("expected 0-9, got {:?}", value),
            })?;
            if level > 9 {
                return Err(ConfigError::InvalidValue {
                    key: "REPORTCREATOR_EXPORT_COMPRESSION".to_string(),
                    message: format!("expected 0-9, got {}", level),
                });
            }
            config.export.compression_level = level;
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {:?}", value),
        }),
    }
}
