use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const DEFAULT_SETTINGS_FILE: &str = "worklog.toml";
pub const DEFAULT_INPUT_FILE: &str = "worklog.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub infile: Option<PathBuf>,
    pub checks: Checks,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Checks {
    /// Reject duplicate person or project ids while building the log.
    pub unique_ids: bool,
    /// Fail when text references a date that has no entry.
    pub strict_dates: bool,
}

impl Default for Checks {
    fn default() -> Self {
        Self {
            unique_ids: true,
            strict_dates: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid settings {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let source = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&source).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, otherwise the default settings file when it
    /// exists in `dir`, otherwise the built-in defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = dir.join(DEFAULT_SETTINGS_FILE);
        if fallback.is_file() {
            tracing::debug!(path = %fallback.display(), "using settings file");
            Self::load(&fallback)
        } else {
            Ok(Self::default())
        }
    }

    /// Input path: the command line wins over the settings file.
    pub fn input_path(&self, cli: Option<&Path>) -> PathBuf {
        cli.filter(|path| !path.as_os_str().is_empty())
            .or(self.infile.as_deref())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE))
    }
}
