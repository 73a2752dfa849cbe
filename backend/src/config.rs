//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and defaults matching the service's fixed layout (port 3000, `items.json`,
//! `uploads/`).

use std::env;
use std::path::PathBuf;

/// Default maximum size of an uploaded image (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// File holding the serialized item collection
    pub items_file: PathBuf,
    /// Directory holding uploaded images
    pub upload_dir: PathBuf,
    /// Largest accepted image upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
            },
            storage: StorageConfig {
                items_file: PathBuf::from("items.json"),
                upload_dir: PathBuf::from("uploads"),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
                host: env::var("HOST").unwrap_or(defaults.server.host),
            },
            storage: StorageConfig {
                items_file: env::var_os("ITEMS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.items_file),
                upload_dir: env::var_os("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|b| b.parse().ok())
                    .unwrap_or(defaults.storage.max_upload_bytes),
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

    const VARS: [&str; 5] = ["PORT", "HOST", "ITEMS_FILE", "UPLOAD_DIR", "MAX_UPLOAD_BYTES"];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server_addr(), "0.0.0.0:3000");
        assert_eq!(config.storage.items_file, PathBuf::from("items.json"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.storage.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("PORT", "8081");
        env::set_var("HOST", "127.0.0.1");
        env::set_var("ITEMS_FILE", "/tmp/data/items.json");
        env::set_var("UPLOAD_DIR", "/tmp/data/uploads");
        env::set_var("MAX_UPLOAD_BYTES", "1024");

        let config = Config::from_env();
        assert_eq!(config.server_addr(), "127.0.0.1:8081");
        assert_eq!(
            config.storage.items_file,
            PathBuf::from("/tmp/data/items.json")
        );
        assert_eq!(config.storage.upload_dir, PathBuf::from("/tmp/data/uploads"));
        assert_eq!(config.storage.max_upload_bytes, 1024);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back() {
        clear_env();
        env::set_var("PORT", "not-a-port");
        env::set_var("MAX_UPLOAD_BYTES", "-5");

        let config = Config::from_env();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        clear_env();
    }
}
