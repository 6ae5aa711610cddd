use std::path::{Path, PathBuf};

use schemaledger_common::{Error, Result};
use tracing::{debug, info};

use crate::model::LedgerConfig;

const ENV_DATABASE: &str = "SCHEMALEDGER_DATABASE";
const ENV_DIALECT: &str = "SCHEMALEDGER_DIALECT";
const ENV_SCHEMA: &str = "SCHEMALEDGER_SCHEMA";
const ENV_TABLE: &str = "SCHEMALEDGER_TABLE";

/// Reads `LedgerConfig` from YAML or TOML files and the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// `<config dir>/schemaledger/config.yml`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("schemaledger").join("config.yml"))
    }

    /// Parse the file at `path`, picking the format from its extension.
    pub fn load(path: &Path) -> Result<LedgerConfig> {
        if !path.exists() {
            return Err(Error::NotFound(format!("config file {}", path.display())));
        }
        let contents = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`ConfigLoader::load`], but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<LedgerConfig> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("no config at {}, using defaults", path.display());
            Ok(LedgerConfig::default())
        }
    }

    /// Apply `SCHEMALEDGER_*` overrides from the process environment.
    pub fn apply_env(config: LedgerConfig) -> Result<LedgerConfig> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides(
        mut config: LedgerConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LedgerConfig> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(database) = get(ENV_DATABASE) {
            config.database = PathBuf::from(database);
        }
        if let Some(dialect) = get(ENV_DIALECT) {
            config.dialect = dialect
                .parse()
                .map_err(|e| Error::Config(format!("{ENV_DIALECT}: {e}")))?;
        }
        if let Some(schema) = get(ENV_SCHEMA) {
            config.schema = schema;
        }
        if let Some(table) = get(ENV_TABLE) {
            config.table = table;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaledger_db::DialectKind;
    use std::collections::HashMap;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.yml",
            "dialect: postgresql\nschema: app\ntable: ledger\n",
        );

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.dialect, DialectKind::Postgres);
        assert_eq!(config.schema, "app");
        assert_eq!(config.table, "ledger");
        assert_eq!(config.database, PathBuf::from("schemaledger.db"));
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.toml",
            "database = \"/var/lib/app.db\"\ndialect = \"sqlite\"\n",
        );

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.database, PathBuf::from("/var/lib/app.db"));
        assert_eq!(config.table, "schema_migrations");
    }

    #[test]
    fn rejects_unknown_extension_and_bad_dialect() {
        let dir = tempfile::tempdir().unwrap();
        let json = write(dir.path(), "config.json", "{}");
        assert!(matches!(ConfigLoader::load(&json), Err(Error::Config(_))));

        let yaml = write(dir.path(), "bad.yaml", "dialect: oracle\n");
        assert!(matches!(ConfigLoader::load(&yaml), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load_or_default(&dir.path().join("absent.yml")).unwrap();
        assert_eq!(config, LedgerConfig::default());

        let err = ConfigLoader::load(&dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("absent.yml"));
    }

    #[test]
    fn unreadable_config_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(ConfigLoader::load(&path), Err(Error::Io(_))));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("SCHEMALEDGER_DIALECT", "MySQL"),
            ("SCHEMALEDGER_TABLE", "applied"),
            ("SCHEMALEDGER_SCHEMA", "  "),
        ]
        .into_iter()
        .collect();

        let base = LedgerConfig {
            schema: "keep".into(),
            ..Default::default()
        };
        let config =
            ConfigLoader::apply_overrides(base, |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.dialect, DialectKind::Mysql);
        assert_eq!(config.table, "applied");
        assert_eq!(config.schema, "keep");
        assert_eq!(config.quoted_table(), "`keepapplied`");
    }

    #[test]
    fn invalid_dialect_override_is_a_config_error() {
        let err = ConfigLoader::apply_overrides(LedgerConfig::default(), |k| {
            (k == "SCHEMALEDGER_DIALECT").then(|| "db2".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("SCHEMALEDGER_DIALECT"));
    }
}
