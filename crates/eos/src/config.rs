//! Rule configuration
//!
//! Rules are configured in the linter's configuration file with one block per rule:
//!
//! ```hcl
//! rule "eos_naming" {
//!   enabled = true
//!   level   = "error"
//!   length  = 24
//! }
//! ```
//!
//! Each rule decodes its block into its own config struct. All fields are optional, a missing field (or a missing
//! block, or a missing file) means the rule's default for that field.
use crate::runner::Runner;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".tflint.hcl";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    #[default]
    Warning,
    Error,
}

impl Severity {
    /// Case insensitive, anything unknown is an error
    pub fn from_level(level: &str) -> Self {
        match level.to_ascii_lowercase().as_str() {
            "notice" => Severity::Notice,
            "warning" => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: hcl::Error,
    },
    #[error("invalid configuration for rule {rule} in {}", .path.display())]
    Decode {
        rule: String,
        path: PathBuf,
        #[source]
        source: hcl::Error,
    },
}

/// A loaded configuration file
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub path: PathBuf,
    body: hcl::Body,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self, ConfigError> {
        let path = path.into();
        match hcl::parse(text) {
            Ok(body) => Ok(Self { path, body }),
            Err(source) => Err(ConfigError::Parse { path, source }),
        }
    }

    /// Find the configuration file
    ///
    /// An explicit path must exist. Otherwise `./.tflint.hcl` is tried, then `$HOME/.tflint.hcl`.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::discover_in(explicit, Path::new("."), home.as_deref())
    }

    pub fn discover_in(
        explicit: Option<&Path>,
        current_dir: &Path,
        home_dir: Option<&Path>,
    ) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }

        let candidates = std::iter::once(current_dir)
            .chain(home_dir)
            .map(|dir| dir.join(CONFIG_FILE_NAME));
        for candidate in candidates {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using config file");
                return Self::load(&candidate).map(Some);
            }
        }

        tracing::debug!("no config file found, using rule defaults");
        Ok(None)
    }

    /// Decode the first `rule "<rule>" { ... }` block
    pub fn decode<T: DeserializeOwned>(&self, rule: &str) -> Result<Option<T>, ConfigError> {
        let Some(block) = self.body.blocks().find(|block| {
            block.identifier() == "rule"
                && block.labels().first().map(|label| label.as_str()) == Some(rule)
        }) else {
            return Ok(None);
        };

        hcl::from_body(block.body().clone())
            .map(Some)
            .map_err(|source| ConfigError::Decode {
                rule: rule.to_string(),
                path: self.path.clone(),
                source,
            })
    }
}

/// Settings every rule has
pub trait RuleConfig: DeserializeOwned + Default {
    fn enabled(&self) -> Option<bool>;
    fn level(&self) -> Option<&str>;

    fn is_enabled(&self) -> bool {
        self.enabled().unwrap_or(true)
    }

    fn severity(&self) -> Severity {
        self.level()
            .map(Severity::from_level)
            .unwrap_or(Severity::Warning)
    }
}

/// Implements [RuleConfig] for a struct with `enabled` and `level` fields
#[macro_export]
macro_rules! rule_config {
    ($ty:ty) => {
        impl $crate::config::RuleConfig for $ty {
            fn enabled(&self) -> Option<bool> {
                self.enabled
            }

            fn level(&self) -> Option<&str> {
                self.level.as_deref()
            }
        }
    };
}

/// Rule config from the runner's config file, defaults if there is none
pub fn load_rule_config<T: RuleConfig>(runner: &dyn Runner, rule: &str) -> Result<T, ConfigError> {
    let config = match runner.config() {
        Some(file) => file.decode(rule)?.unwrap_or_default(),
        None => T::default(),
    };
    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Deserialize, Default, Debug, PartialEq)]
    struct Example {
        enabled: Option<bool>,
        level: Option<String>,
        column: Option<i64>,
        nested: Option<Nested>,
    }
    rule_config!(Example);

    #[derive(Deserialize, Default, Debug, PartialEq)]
    struct Nested {
        flag: Option<bool>,
    }

    #[test]
    fn severity_levels() {
        assert_eq!(Severity::from_level("notice"), Severity::Notice);
        assert_eq!(Severity::from_level("WARNING"), Severity::Warning);
        assert_eq!(Severity::from_level("Error"), Severity::Error);
        assert_eq!(Severity::from_level("loud"), Severity::Error);
    }

    #[test]
    fn decode_rule_block() {
        let config = ConfigFile::parse(
            ".tflint.hcl",
            r#"
            plugin "eos" { enabled = true }

            rule "example" {
              level  = "notice"
              column = 100
              nested {
                flag = false
              }
            }

            rule "example" {
              column = 1
            }
            "#,
        )
        .unwrap();

        let example: Example = config.decode("example").unwrap().unwrap();
        assert_eq!(
            example,
            Example {
                enabled: None,
                level: Some("notice".into()),
                column: Some(100),
                nested: Some(Nested { flag: Some(false) }),
            }
        );
        assert!(example.is_enabled());
        assert_eq!(example.severity(), Severity::Notice);

        assert_eq!(config.decode::<Example>("other").unwrap(), None);
    }

    #[test]
    fn decode_error_names_rule() {
        let config = ConfigFile::parse(".tflint.hcl", "rule \"example\" {\n column = \"wide\"\n}\n")
            .unwrap();
        let err = config.decode::<Example>("example").unwrap_err();
        assert!(err.to_string().contains("example"));
        assert!(err.to_string().contains(".tflint.hcl"));
    }

    #[test]
    fn discovery_order() {
        let cwd = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();

        assert!(ConfigFile::discover_in(None, cwd.path(), Some(home.path()))
            .unwrap()
            .is_none());

        std::fs::write(home.path().join(CONFIG_FILE_NAME), "").unwrap();
        let found = ConfigFile::discover_in(None, cwd.path(), Some(home.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.path, home.path().join(CONFIG_FILE_NAME));

        std::fs::write(cwd.path().join(CONFIG_FILE_NAME), "").unwrap();
        let found = ConfigFile::discover_in(None, cwd.path(), Some(home.path()))
            .unwrap()
            .unwrap();
        assert_eq!(found.path, cwd.path().join(CONFIG_FILE_NAME));

        let missing = cwd.path().join("missing.hcl");
        assert!(matches!(
            ConfigFile::discover_in(Some(&missing), cwd.path(), Some(home.path())),
            Err(ConfigError::Io { .. })
        ));
    }
}
