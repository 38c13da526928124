pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::Settings;

pub use adapters::{
    spreadsheet::SpreadsheetReader,
    storage::LocalStorage,
    supabase::{StoreConfig, SupabaseStore},
};
pub use core::{etl::ImportEngine, pipeline::SpreadsheetPipeline};
pub use domain::model::{ImportReport, PlayerFilter, PlayerRecord, StoredPlayer};
pub use utils::error::{ImportError, Result};
