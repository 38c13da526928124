#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, ImportArgs, ListArgs};

use crate::adapters::supabase::{StoreConfig, DEFAULT_TABLE, DEFAULT_TIMEOUT_SECONDS};
use crate::core::batch_importer::DEFAULT_BATCH_SIZE;
use crate::core::field_mapper::{FieldMapper, FieldMapping};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_required_field, Validate,
};
use std::collections::HashMap;

pub const URL_ENV_VARS: [&str; 2] = ["SUPABASE_URL", "REACT_APP_SUPABASE_URL"];
pub const KEY_ENV_VARS: [&str; 2] = ["SUPABASE_ANON_KEY", "REACT_APP_SUPABASE_ANON_KEY"];

/// 合併命令列、設定檔與環境變數後的設定。優先順序：命令列 > 設定檔 > 環境變數 > 預設值
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub table: String,
    pub timeout_seconds: u64,
    pub batch_size: usize,
    pub strict: bool,
    pub monitor: bool,
    pub dry_run: bool,
    pub report_path: Option<String>,
    pub aliases: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: None,
            store_key: None,
            table: DEFAULT_TABLE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            batch_size: DEFAULT_BATCH_SIZE,
            strict: false,
            monitor: false,
            dry_run: false,
            report_path: None,
            aliases: HashMap::new(),
        }
    }
}

impl Settings {
    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig, file: Option<&toml_config::TomlConfig>) -> Self {
        Self::resolve_with_env(cli, file, |name| std::env::var(name).ok())
    }

    #[cfg(feature = "cli")]
    pub fn resolve_with_env(
        cli: &CliConfig,
        file: Option<&toml_config::TomlConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let from_env = |names: &[&str]| names.iter().find_map(|name| env(name));
        let defaults = Settings::default();

        let mut settings = Settings {
            store_url: cli
                .store_url
                .clone()
                .or_else(|| file.and_then(|f| f.store.url.clone()))
                .or_else(|| from_env(&URL_ENV_VARS)),
            store_key: cli
                .store_key
                .clone()
                .or_else(|| file.and_then(|f| f.store.api_key.clone()))
                .or_else(|| from_env(&KEY_ENV_VARS)),
            table: cli
                .table
                .clone()
                .or_else(|| file.and_then(|f| f.store.table.clone()))
                .unwrap_or(defaults.table),
            timeout_seconds: file
                .and_then(|f| f.store.timeout_seconds)
                .unwrap_or(defaults.timeout_seconds),
            batch_size: file
                .and_then(|f| f.import.batch_size)
                .unwrap_or(defaults.batch_size),
            strict: file.and_then(|f| f.import.strict).unwrap_or(false),
            monitor: file.map(|f| f.monitoring_enabled()).unwrap_or(false),
            dry_run: false,
            report_path: file.and_then(|f| f.import.report_path.clone()),
            aliases: file.map(|f| f.mapping.aliases.clone()).unwrap_or_default(),
        };

        if let Command::Import(args) = &cli.command {
            if let Some(batch_size) = args.batch_size {
                settings.batch_size = batch_size;
            }
            settings.strict |= args.strict;
            settings.monitor |= args.monitor;
            settings.dry_run = args.dry_run;
            if args.report.is_some() {
                settings.report_path = args.report.clone();
            }
        }

        settings
    }

    pub fn field_mapper(&self) -> Result<FieldMapper> {
        let mapping = FieldMapping::default().with_aliases(&self.aliases)?;
        Ok(FieldMapper::new(mapping))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::from_provider(self)
    }
}

impl ConfigProvider for Settings {
    fn store_url(&self) -> &str {
        self.store_url.as_deref().unwrap_or_default()
    }

    fn store_key(&self) -> &str {
        self.store_key.as_deref().unwrap_or_default()
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_required_field("store.url", &self.store_url)?;
        validate_required_field("store.api_key", &self.store_key)?;
        self.store_config().validate()?;
        validate_positive_number("import.batch_size", self.batch_size, 1)?;
        if let Some(report_path) = &self.report_path {
            validate_path("import.report_path", report_path)?;
        }
        self.field_mapper()?;
        Ok(())
    }
}
