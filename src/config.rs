//! Generator configuration.
//!
//! [`GeneratorConfig::load`] reads the optional `config/daoforge.toml` and
//! `DAOFORGE`-prefixed environment variables (`__` separates nested keys).
//! Everything lives under a `[generator]` section; when the section is
//! missing, defaults apply.
//!
//! ```toml
//! [generator]
//! ordering = true
//! bigint_unsigned = "u64"
//! dirty_tracking = "flags"
//!
//! [generator.naming]
//! dirty_flag_suffix = "IsSet"
//! ```

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub use crate::naming::NamingConvention;
pub use crate::types::BigIntUnsigned;

const DEFAULT_CONFIG_FILE: &str = "config/daoforge.toml";
const ENV_PREFIX: &str = "DAOFORGE";
const SECTION: &str = "generator";

/// Whether records get paired dirty-flag names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtyTracking {
    /// Derive a dirty-flag name per field and check it for collisions
    #[default]
    Flags,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub naming: NamingConvention,
    pub dirty_tracking: DirtyTracking,
    /// List-returning selects take an ordering parameter
    pub ordering: bool,
    pub bigint_unsigned: BigIntUnsigned,
    /// Stop the whole batch at the first failing table
    pub all_or_nothing: bool,
    pub enum_comment_prefix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            naming: NamingConvention::default(),
            dirty_tracking: DirtyTracking::default(),
            ordering: true,
            bigint_unsigned: BigIntUnsigned::default(),
            all_or_nothing: false,
            enum_comment_prefix: "enum.".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Load from `config/daoforge.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    log::warn!("failed to load {}, falling back to env: {}", DEFAULT_CONFIG_FILE, err);
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "failed to load configuration from file ({}) and from env ({})",
                            err, env_err
                        ))
                    })?
            }
        };
        Self::from_settings(&settings)
    }

    /// Load from an explicit file; the file must exist. Env vars still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<GeneratorConfig>(SECTION) {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "generator configuration is invalid: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = GeneratorConfig::default();
        assert!(cfg.ordering);
        assert!(!cfg.all_or_nothing);
        assert_eq!(cfg.dirty_tracking, DirtyTracking::Flags);
        assert_eq!(cfg.bigint_unsigned, BigIntUnsigned::U64);
        assert_eq!(cfg.naming.dirty_flag_suffix, "IsSet");
        assert_eq!(cfg.enum_comment_prefix, "enum.");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[generator]\nordering = false\nbigint_unsigned = \"i64\"\n\n[generator.naming]\nkey_connective = \"With\""
        )
        .unwrap();

        let cfg = GeneratorConfig::load_from(file.path()).unwrap();
        assert!(!cfg.ordering);
        assert_eq!(cfg.bigint_unsigned, BigIntUnsigned::I64);
        assert_eq!(cfg.naming.key_connective, "With");
        assert_eq!(cfg.naming.by_connective, "By");
        assert_eq!(cfg.dirty_tracking, DirtyTracking::Flags);
    }

    #[test]
    fn test_missing_section_yields_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[other]\nvalue = 1").unwrap();
        let cfg = GeneratorConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg, GeneratorConfig::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(GeneratorConfig::load_from("does/not/exist.toml").is_err());
    }
}
