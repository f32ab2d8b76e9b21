use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    magic::{
        DEFAULT_ALLOCATORS, DEFAULT_MAX_INLINE_ATTEMPTS, DEFAULT_MEMSET_FUNCTIONS, ENV_CONFIG_PATH,
    },
    utils::error::{DiffError, DiffResult},
};

/// Session-wide comparator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Ignore integer signedness and width, look through casts and skip
    /// allocas and casts that have no counterpart.
    pub relaxed: bool,

    /// Functions whose first argument is an allocation size.
    pub allocators: Vec<String>,

    /// Functions shaped `(dest, fill, size, ...)`.
    pub memset_functions: Vec<String>,

    /// Maximum number of compare rounds per function pair.
    pub max_inline_attempts: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            relaxed: false,
            allocators: DEFAULT_ALLOCATORS.iter().map(|s| s.to_string()).collect(),
            memset_functions: DEFAULT_MEMSET_FUNCTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_inline_attempts: DEFAULT_MAX_INLINE_ATTEMPTS,
        }
    }
}

/// `name` is `entry` or one of its dotted overloads.
fn matches_entry(entry: &str, name: &str) -> bool {
    name == entry
        || name
            .strip_prefix(entry)
            .is_some_and(|rest| rest.starts_with('.'))
}

impl DiffConfig {
    pub fn relaxed() -> Self {
        Self {
            relaxed: true,
            ..Default::default()
        }
    }

    pub fn is_allocator(&self, name: &str) -> bool {
        self.allocators.iter().any(|entry| matches_entry(entry, name))
    }

    pub fn is_memset(&self, name: &str) -> bool {
        self.memset_functions
            .iter()
            .any(|entry| matches_entry(entry, name))
    }

    /// Get the default path to the configuration file.
    pub fn default_path() -> PathBuf {
        // Check if the environment variable is set
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        // Fallback to default paths based on OS
        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push("diffcmp");
        path.push("config.toml");
        path
    }

    /// Parse a configuration from TOML text. Missing keys take their default.
    pub fn from_toml_str(toml_str: &str) -> DiffResult<Self> {
        toml::from_str(toml_str).map_err(|e| DiffError::ConfigParse {
            source: e,
            file: "<string>".to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> DiffResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;

        toml::from_str(&toml_str).map_err(|e| DiffError::ConfigParse {
            source: e,
            file: path.display().to_string(),
        })
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> DiffResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| {
            DiffError::Unknown(format!(
                "Failed during serialization of TOML to path `{}`: {}",
                path.display(),
                e
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_overloads() {
        let config = DiffConfig::default();
        assert!(config.is_memset("llvm.memset.p0.i64"));
        assert!(config.is_memset("memset"));
        assert!(!config.is_memset("memset_s"));
        assert!(config.is_allocator("kzalloc"));
        assert!(!config.is_allocator("kmalloc_array"));
    }

    #[test]
    fn test_partial_toml() {
        let config = DiffConfig::from_toml_str("relaxed = true\nallocators = [\"xalloc\"]\n")
            .expect("valid toml");
        assert!(config.relaxed);
        assert!(config.is_allocator("xalloc"));
        assert!(!config.is_allocator("kmalloc"));
        assert_eq!(config.max_inline_attempts, DEFAULT_MAX_INLINE_ATTEMPTS);

        assert!(matches!(
            DiffConfig::from_toml_str("relaxed = 3"),
            Err(DiffError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("diffcmp-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        let mut config = DiffConfig::relaxed();
        config.max_inline_attempts = 3;
        config.save_to_toml(&path).expect("writable temp dir");

        let loaded = DiffConfig::load_from_toml(&path).expect("readable config");
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
        assert!(matches!(
            DiffConfig::load_from_toml(&path),
            Err(DiffError::Io(_))
        ));
    }
}
