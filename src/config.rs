use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from pagedrop.toml.
///
/// Resolution order: defaults, then the config file, then the `PORT`
/// environment variable, then CLI flags (applied by main).
#[derive(Debug, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DropConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory delivered files are written into.
    pub dir: PathBuf,
    /// Extension appended to armed names that lack it.
    pub extension: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            extension: ".mhtml".to_string(),
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The config file is not valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// CLI flag values, applied on top of file and environment settings.
#[derive(Debug, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub dir: Option<PathBuf>,
    pub extension: Option<String>,
}

impl DropConfig {
    /// Load from `path`. A missing file yields the defaults; an
    /// unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply the `PORT` environment variable, if set and parseable.
    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var("PORT") {
            match raw.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring unparseable PORT");
                }
            }
        }
    }

    /// Apply CLI flag values. These win over the file and `PORT`.
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(dir) = overrides.dir {
            self.upload.dir = dir;
        }
        if let Some(extension) = overrides.extension {
            self.upload.extension = extension;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    // PORT is process-global; tests touching it serialize on this lock
    // so they cannot race each other under the parallel test runner.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn defaults() {
        let config = DropConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upload.dir, PathBuf::from("."));
        assert_eq!(config.upload.extension, ".mhtml");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = DropConfig::load(Path::new("/nonexistent/pagedrop.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagedrop.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = DropConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.upload.extension, ".mhtml");
    }

    #[test]
    fn full_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagedrop.toml");
        std::fs::write(
            &path,
            "[server]\nbind = \"127.0.0.1\"\nport = 9999\n\n[upload]\ndir = \"/tmp/drops\"\nextension = \".eml\"\n",
        )
        .unwrap();

        let config = DropConfig::load(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.upload.dir, PathBuf::from("/tmp/drops"));
        assert_eq!(config.upload.extension, ".eml");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagedrop.toml");
        std::fs::write(&path, "[server\nport = oops").unwrap();

        let err = DropConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn port_env_overrides_and_garbage_is_ignored() {
        let _env = env_lock();

        let mut config = DropConfig::default();
        std::env::set_var("PORT", "4567");
        config.apply_env();
        assert_eq!(config.server.port, 4567);

        std::env::set_var("PORT", "not-a-port");
        config.apply_env();
        assert_eq!(config.server.port, 4567);

        std::env::remove_var("PORT");
        config.apply_env();
        assert_eq!(config.server.port, 4567);
    }

    #[test]
    fn cli_overrides_beat_env_and_file() {
        let _env = env_lock();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagedrop.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let mut config = DropConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 8080);

        std::env::set_var("PORT", "4567");
        config.apply_env();
        assert_eq!(config.server.port, 4567);

        config.apply_overrides(Overrides {
            port: Some(9001),
            bind: Some("127.0.0.1".to_string()),
            ..Default::default()
        });
        std::env::remove_var("PORT");

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.bind, "127.0.0.1");
        // Unset flags leave the resolved values alone.
        config.apply_overrides(Overrides::default());
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.upload.extension, ".mhtml");
    }
}
