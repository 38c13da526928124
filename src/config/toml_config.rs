use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub import: ImportSection,
    #[serde(default)]
    pub mapping: MappingSection,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSection {
    pub batch_size: Option<usize>,
    pub strict: Option<bool>,
    pub report_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingSection {
    /// 額外的欄位標題 -> 標準欄位名稱
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound {
                path: path.as_ref().display().to_string(),
            },
            _ => ImportError::IoError(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPABASE_ANON_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ImportError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.store.url {
            validate_url("store.url", url)?;
        }
        if let Some(batch_size) = self.import.batch_size {
            validate_positive_number("import.batch_size", batch_size, 1)?;
        }
        if let Some(report_path) = &self.import.report_path {
            validate_path("import.report_path", report_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[store]
url = "https://abc.supabase.co"
api_key = "anon-key"
table = "players_staging"
timeout_seconds = 10

[import]
batch_size = 25
strict = true

[mapping.aliases]
"Nome Giocatore" = "name"

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.store.url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.store.table.as_deref(), Some("players_staging"));
        assert_eq!(config.import.batch_size, Some(25));
        assert_eq!(config.import.strict, Some(true));
        assert_eq!(config.mapping.aliases.get("Nome Giocatore").unwrap(), "name");
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.store.url.is_none());
        assert!(config.mapping.aliases.is_empty());
        assert!(!config.monitoring_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SCOUT_IMPORT_TEST_KEY", "secret-anon-key");

        let config = TomlConfig::from_toml_str(
            r#"
[store]
api_key = "${SCOUT_IMPORT_TEST_KEY}"
url = "${SCOUT_IMPORT_TEST_UNSET_URL}"
"#,
        )
        .unwrap();

        assert_eq!(config.store.api_key.as_deref(), Some("secret-anon-key"));
        assert_eq!(
            config.store.url.as_deref(),
            Some("${SCOUT_IMPORT_TEST_UNSET_URL}")
        );
        assert!(config.validate().is_err());

        std::env::remove_var("SCOUT_IMPORT_TEST_KEY");
    }

    #[test]
    fn test_zero_batch_size_is_invalid() {
        let config = TomlConfig::from_toml_str("[import]\nbatch_size = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[store]\nurl = \"http://localhost:54321\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store.url.as_deref(), Some("http://localhost:54321"));

        assert!(matches!(
            TomlConfig::from_file("does-not-exist.toml"),
            Err(ImportError::FileNotFound { .. })
        ));
    }
}
