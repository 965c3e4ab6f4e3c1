//! Configuration Vault – reads/writes `~/.catia/config.toml`.

use catia_memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user configuration stored in `~/.catia/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings handed to `MemoryStore::open`.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Defaults with every memory file under `<home>/.catia/memory/`.
    pub fn for_home(home: &str) -> Self {
        Self {
            memory: MemoryConfig::in_dir(catia_dir_for_home(home).join("memory")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_home(&home_dir())
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

fn catia_dir_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".catia")
}

/// Return the path to `~/.catia/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    catia_dir_for_home(home).join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `CATIA_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `CATIA_MEMORY_PATH` | `memory.memory_path` |
/// | `CATIA_KEY_PATH` | `memory.key_path` |
/// | `CATIA_CONVERSATION_LOG` | `memory.conversation_log_path` (empty disables) |
/// | `CATIA_FUZZY_CUTOFF` | `memory.fuzzy.min_similarity` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("CATIA_MEMORY_PATH") {
        cfg.memory.memory_path = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("CATIA_KEY_PATH") {
        cfg.memory.key_path = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("CATIA_CONVERSATION_LOG") {
        cfg.memory.conversation_log_path = if v.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(v))
        };
    }
    if let Ok(v) = std::env::var("CATIA_FUZZY_CUTOFF")
        && let Ok(cutoff) = v.parse::<f64>()
        && (0.0..=1.0).contains(&cutoff)
    {
        cfg.memory.fuzzy.min_similarity = cutoff;
    }
}

/// Save the config to disk, creating `~/.catia/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
