//! Skywire Configuration System
//!
//! Loads configuration from YAML files with a cascading priority system:
//! 1. `./skywire.yaml` (current directory - highest priority)
//! 2. `~/.skywire.yaml` (home directory)
//! 3. `~/.config/skywire/skywire.yaml` (user config directory)
//! 4. `/etc/skywire/skywire.yaml` (system - lowest priority)
//!
//! Values from higher priority files override those from lower priority files.
//!
//! # YAML Structure
//!
//! ```yaml
//! node:
//!   identity:
//!     secret: "0102...1f20"
//!   routing:
//!     keep_alive_secs: 1800
//!     gc_interval_secs: 5
//!     gc_batch_size: 256
//!   buffers:
//!     packet_channel: 1024
//!     app_channel: 1024
//! ```

mod node;

use crate::{Identity, IdentityError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use node::{BuffersConfig, IdentityConfig, NodeConfig, RoutingConfig};

/// Default config filename.
const CONFIG_FILENAME: &str = "skywire.yaml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Node configuration (`node.*`).
    #[serde(default)]
    pub node: NodeConfig,
}

impl Config {
    /// Create a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the standard search paths.
    ///
    /// Returns a tuple of (config, paths_loaded) where paths_loaded contains
    /// the paths that were successfully loaded.
    pub fn load() -> Result<(Self, Vec<PathBuf>), ConfigError> {
        let search_paths = Self::search_paths();
        Self::load_from_paths(&search_paths)
    }

    /// Load configuration from specific paths.
    ///
    /// Paths are processed in order, with later paths overriding earlier ones.
    pub fn load_from_paths(paths: &[PathBuf]) -> Result<(Self, Vec<PathBuf>), ConfigError> {
        let mut config = Config::default();
        let mut loaded_paths = Vec::new();

        for path in paths {
            if path.exists() {
                let file_config = Self::load_file(path)?;
                config.merge(file_config);
                loaded_paths.push(path.clone());
            }
        }

        Ok((config, loaded_paths))
    }

    /// Load configuration from a single file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the standard search paths in priority order (lowest to highest).
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        paths.push(PathBuf::from("/etc/skywire").join(CONFIG_FILENAME));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("skywire").join(CONFIG_FILENAME));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".skywire.yaml"));
        }

        paths.push(PathBuf::from(".").join(CONFIG_FILENAME));

        paths
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Config) {
        self.node.merge(other.node);
    }

    /// Create an Identity from this configuration.
    ///
    /// If a secret is configured, uses that to create the identity.
    /// Otherwise, generates a new random identity.
    pub fn create_identity(&self) -> Result<Identity, ConfigError> {
        match &self.node.identity.secret {
            Some(secret) => Ok(Identity::from_secret_str(secret)?),
            None => Ok(Identity::generate()),
        }
    }

    /// Check if an identity is configured (vs. will be generated).
    pub fn has_identity(&self) -> bool {
        self.node.identity.secret.is_some()
    }

    /// Serialize this configuration to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{DEFAULT_GC_INTERVAL, DEFAULT_KEEP_ALIVE};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const SECRET: &str = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20";

    #[test]
    fn test_empty_config() {
        let config = Config::new();
        assert!(config.node.identity.secret.is_none());
        assert!(!config.has_identity());
        assert_eq!(config.node.routing.keep_alive(), DEFAULT_KEEP_ALIVE);
        assert_eq!(config.node.routing.gc_interval(), DEFAULT_GC_INTERVAL);
        assert_eq!(config.node.buffers.packet_channel(), 1024);
    }

    #[test]
    fn test_parse_yaml_empty() {
        let config: Config = serde_yaml::from_str("").unwrap();
        assert!(config.node.identity.secret.is_none());
    }

    #[test]
    fn test_parse_yaml_routing() {
        let yaml = r#"
node:
  routing:
    keep_alive_secs: 60
    gc_interval_secs: 2
    gc_batch_size: 16
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let table = config.node.routing.table_config();

        assert_eq!(table.keep_alive, Duration::from_secs(60));
        assert_eq!(table.gc_interval, Duration::from_secs(2));
        assert_eq!(table.gc_batch_size, 16);
    }

    #[test]
    fn test_parse_yaml_rejects_unknown_routing_key() {
        let yaml = r#"
node:
  routing:
    keepalive: 60
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_create_identity_from_secret() {
        let mut config = Config::new();
        config.node.identity.secret = Some(SECRET.to_string());

        let a = config.create_identity().unwrap();
        let b = config.create_identity().unwrap();
        assert_eq!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn test_create_identity_generates_new() {
        let config = Config::new();
        let identity = config.create_identity().unwrap();
        assert!(!identity.pubkey().is_null());
    }

    #[test]
    fn test_create_identity_bad_secret() {
        let mut config = Config::new();
        config.node.identity.secret = Some("zz".to_string());
        assert!(matches!(
            config.create_identity(),
            Err(ConfigError::Identity(_))
        ));
    }

    #[test]
    fn test_merge_overrides_only_present_values() {
        let mut base = Config::new();
        base.node.identity.secret = Some("base".to_string());
        base.node.routing.keep_alive_secs = Some(100);
        base.node.routing.gc_interval_secs = Some(7);

        let mut over = Config::new();
        over.node.routing.keep_alive_secs = Some(200);
        over.node.buffers.app_channel = Some(8);

        base.merge(over);

        assert_eq!(base.node.identity.secret, Some("base".to_string()));
        assert_eq!(base.node.routing.keep_alive_secs, Some(200));
        assert_eq!(base.node.routing.gc_interval_secs, Some(7));
        assert_eq!(base.node.buffers.app_channel(), 8);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("skywire.yaml");

        fs::write(
            &config_path,
            format!("node:\n  identity:\n    secret: \"{}\"\n", SECRET),
        )
        .unwrap();

        let config = Config::load_file(&config_path).unwrap();
        assert_eq!(config.node.identity.secret.as_deref(), Some(SECRET));
    }

    #[test]
    fn test_load_file_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.yaml");
        fs::write(&config_path, "node: [unclosed").unwrap();

        assert!(matches!(
            Config::load_file(&config_path),
            Err(ConfigError::ParseYaml { .. })
        ));
    }

    #[test]
    fn test_load_from_paths_merges() {
        let temp_dir = TempDir::new().unwrap();
        let low_priority = temp_dir.path().join("low.yaml");
        let high_priority = temp_dir.path().join("high.yaml");

        fs::write(
            &low_priority,
            r#"
node:
  routing:
    keep_alive_secs: 10
    gc_interval_secs: 3
"#,
        )
        .unwrap();

        fs::write(
            &high_priority,
            r#"
node:
  routing:
    keep_alive_secs: 20
"#,
        )
        .unwrap();

        let paths = vec![low_priority, high_priority];
        let (config, loaded) = Config::load_from_paths(&paths).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(config.node.routing.keep_alive(), Duration::from_secs(20));
        assert_eq!(config.node.routing.gc_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_skips_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("exists.yaml");
        let missing = temp_dir.path().join("missing.yaml");

        fs::write(&existing, "node:\n  buffers:\n    packet_channel: 64\n").unwrap();

        let paths = vec![missing, existing.clone()];
        let (config, loaded) = Config::load_from_paths(&paths).unwrap();

        assert_eq!(loaded, vec![existing]);
        assert_eq!(config.node.buffers.packet_channel(), 64);
    }

    #[test]
    fn test_search_paths_includes_expected() {
        let paths = Config::search_paths();

        assert!(paths.iter().any(|p| p.ends_with("skywire.yaml")));
        assert!(paths
            .iter()
            .any(|p| p.starts_with("/etc/skywire") && p.ends_with("skywire.yaml")));
    }

    #[test]
    fn test_to_yaml_omits_unset() {
        let config = Config::new();
        let yaml = config.to_yaml().unwrap();
        assert!(!yaml.contains("secret:"));
        assert!(!yaml.contains("keep_alive_secs:"));

        let mut config = Config::new();
        config.node.routing.gc_batch_size = Some(32);
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("gc_batch_size: 32"));
    }
}
