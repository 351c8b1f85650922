// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;

static DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

/// Env var naming an optional YAML config file.
pub const CONFIG_FILE_ENV: &str = "BANKS_ETL_CONFIG";

/// Everything the pipeline needs to know about where to read and write.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_url: Url,
    pub rate_path: PathBuf,
    pub csv_output_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
    /// Labels for the two extracted fields: bank name, USD market cap.
    pub columns: Vec<String>,
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: Url::parse(DEFAULT_SOURCE_URL).expect("default source URL should parse"),
            rate_path: PathBuf::from("./exchange_rate.csv"),
            csv_output_path: PathBuf::from("./Largest_banks_data.csv"),
            db_path: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
            log_path: PathBuf::from("./code_log.txt"),
            columns: vec!["Name".to_string(), "MC_USD_Billion".to_string()],
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the YAML file named by `BANKS_ETL_CONFIG` if set, then
    /// per-field env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var(CONFIG_FILE_ENV) {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a YAML file; fields it omits keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg: Config =
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        debug!(config = ?path, "loaded config file");
        Ok(cfg)
    }

    /// Override fields from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BANKS_SOURCE_URL") {
            self.source_url =
                Url::parse(&v).with_context(|| format!("parsing BANKS_SOURCE_URL {}", v))?;
        }
        if let Some(v) = lookup("BANKS_RATE_PATH") {
            self.rate_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("BANKS_CSV_PATH") {
            self.csv_output_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("BANKS_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("BANKS_TABLE_NAME") {
            self.table_name = v;
        }
        if let Some(v) = lookup("BANKS_LOG_PATH") {
            self.log_path = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            bail!("table_name must not be empty");
        }
        if self.columns.len() != 2 {
            bail!(
                "columns must name exactly two fields (name, market cap), got {:?}",
                self.columns
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_fixed_run() {
        let cfg = Config::default();
        assert_eq!(cfg.table_name, "Largest_banks");
        assert_eq!(cfg.db_path, PathBuf::from("Banks.db"));
        assert_eq!(cfg.columns, vec!["Name", "MC_USD_Billion"]);
        assert!(cfg.source_url.as_str().contains("List_of_largest_banks"));
        cfg.validate().unwrap();
    }

    #[test]
    fn yaml_overrides_only_given_fields() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "table_name: Banks_test\ndb_path: /tmp/x.db").unwrap();

        let cfg = Config::from_yaml_file(f.path()).unwrap();
        assert_eq!(cfg.table_name, "Banks_test");
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.log_path, Config::default().log_path);
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BANKS_SOURCE_URL", "http://localhost:8000/banks.html"),
            ("BANKS_TABLE_NAME", "Other"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.source_url.as_str(), "http://localhost:8000/banks.html");
        assert_eq!(cfg.table_name, "Other");
    }

    #[test]
    fn bad_env_url_is_an_error() {
        let mut cfg = Config::default();
        assert!(cfg
            .apply_env(|k| (k == "BANKS_SOURCE_URL").then(|| "not a url".to_string()))
            .is_err());
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let mut cfg = Config::default();
        cfg.table_name = "  ".into();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.columns.push("Extra".into());
        assert!(cfg.validate().is_err());
    }
}
