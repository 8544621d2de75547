//! Configuration loading and layered value resolution
//!
//! Every service resolves its settings with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use std::path::Path;

/// Environment variable naming the config file location
pub const CONFIG_PATH_ENV: &str = "KUDOS_CONFIG";

/// Config file looked for in the working directory when nothing else is given
const DEFAULT_CONFIG_FILE: &str = "kudos.toml";

/// Parsed TOML config file, absent when no file was found
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    root: Option<toml::Value>,
}

impl ConfigFile {
    /// Load the config file named by the CLI argument, the `KUDOS_CONFIG`
    /// environment variable, or `./kudos.toml`, in that order.
    ///
    /// A missing file is not an error (services run fine on defaults); an
    /// unreadable or unparsable file is.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = match cli_path {
            Some(p) => p.to_path_buf(),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) => p.into(),
                Err(_) => {
                    let default = Path::new(DEFAULT_CONFIG_FILE);
                    if !default.exists() {
                        return Ok(Self::default());
                    }
                    default.to_path_buf()
                }
            },
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let root = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;

        Ok(Self { root: Some(root) })
    }

    /// Look up `section.key` as a string
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.root
            .as_ref()?
            .get(section)?
            .get(key)?
            .as_str()
            .map(|s| s.to_string())
    }
}

/// Resolve one setting through the CLI > env > file > default cascade
pub fn resolve(
    cli_arg: Option<String>,
    env_var: &str,
    file: &ConfigFile,
    section: &str,
    key: &str,
    default: &str,
) -> String {
    if let Some(value) = cli_arg {
        return value;
    }
    if let Ok(value) = std::env::var(env_var) {
        return value;
    }
    if let Some(value) = file.get(section, key) {
        return value;
    }
    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_empty_config() {
        let file = ConfigFile::default();
        assert_eq!(file.get("bus", "url"), None);
    }

    #[test]
    fn loads_sections_from_toml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[bus]\nurl = \"http://localhost:8085\"").unwrap();

        let file = ConfigFile::load(Some(tmp.path())).unwrap();
        assert_eq!(
            file.get("bus", "url"),
            Some("http://localhost:8085".to_string())
        );
        assert_eq!(file.get("bus", "missing"), None);
    }

    #[test]
    fn cli_argument_wins_over_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[bus]\nurl = \"http://from-file\"").unwrap();
        let file = ConfigFile::load(Some(tmp.path())).unwrap();

        let value = resolve(
            Some("http://from-cli".to_string()),
            "KUDOS_TEST_UNSET_VAR",
            &file,
            "bus",
            "url",
            "http://default",
        );
        assert_eq!(value, "http://from-cli");
    }

    #[test]
    fn default_used_when_nothing_set() {
        let value = resolve(
            None,
            "KUDOS_TEST_UNSET_VAR",
            &ConfigFile::default(),
            "bus",
            "url",
            "http://default",
        );
        assert_eq!(value, "http://default");
    }
}
