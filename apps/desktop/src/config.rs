//! Application configuration from the environment.

use std::path::PathBuf;

const APP_DIR: &str = "synora";
const DB_FILE: &str = "synora.db";
const DEFAULT_REGION: &str = "westeurope";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Directory of `*.json` word files. `None` starts with an empty catalog.
    pub catalog_dir: Option<PathBuf>,
    pub azure_speech_key: Option<String>,
    pub azure_speech_region: String,
}

impl AppConfig {
    /// Read configuration from environment variables.
    ///
    /// - SYNORA_DATA_DIR: Data directory (default: platform local data dir)
    /// - SYNORA_CATALOG_DIR: Word catalog directory
    /// - AZURE_SPEECH_KEY: Speech subscription key; speech is disabled without it
    /// - AZURE_SPEECH_REGION: Speech region (default: westeurope)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = non_empty("SYNORA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Self {
            data_dir,
            catalog_dir: non_empty("SYNORA_CATALOG_DIR").map(PathBuf::from),
            azure_speech_key: non_empty("AZURE_SPEECH_KEY"),
            azure_speech_region: non_empty("AZURE_SPEECH_REGION")
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}

fn default_data_dir() -> PathBuf {
    // Use app data directory for production, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert!(config.data_dir.ends_with(APP_DIR));
        assert_eq!(config.catalog_dir, None);
        assert_eq!(config.azure_speech_key, None);
        assert_eq!(config.azure_speech_region, "westeurope");
        assert!(config.db_path().ends_with("synora/synora.db"));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("SYNORA_DATA_DIR", "/tmp/synora-data"),
            ("SYNORA_CATALOG_DIR", "/tmp/words"),
            ("AZURE_SPEECH_KEY", "secret"),
            ("AZURE_SPEECH_REGION", "northeurope"),
        ]);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/synora-data/synora.db"));
        assert_eq!(config.catalog_dir, Some(PathBuf::from("/tmp/words")));
        assert_eq!(config.azure_speech_key.as_deref(), Some("secret"));
        assert_eq!(config.azure_speech_region, "northeurope");
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = config(&[("AZURE_SPEECH_KEY", "  "), ("AZURE_SPEECH_REGION", "")]);
        assert_eq!(config.azure_speech_key, None);
        assert_eq!(config.azure_speech_region, "westeurope");
    }
}
