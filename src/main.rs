use clap::Parser;
use scout_import::config::toml_config::TomlConfig;
use scout_import::config::{Command, ImportArgs, ListArgs};
use scout_import::core::normalizer::RecordNormalizer;
use scout_import::core::{PlayerStore, Storage};
use scout_import::utils::error::ErrorSeverity;
use scout_import::utils::logger::{self, LogFormat};
use scout_import::utils::validation::Validate;
use scout_import::{
    CliConfig, ImportEngine, ImportError, ImportReport, LocalStorage, PlayerFilter, Settings,
    SpreadsheetPipeline, SupabaseStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(cli.verbose, log_format);

    tracing::info!("Starting scout-import CLI");
    tracing::debug!("CLI config: {:?}", cli.command);

    let exit_code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            }
        }
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}

async fn run(cli: &CliConfig) -> Result<i32, ImportError> {
    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("📄 Loading configuration from {}", path);
            let config = TomlConfig::from_file(path)?;
            config.validate()?;
            Some(config)
        }
        None => None,
    };

    let settings = Settings::resolve(cli, file_config.as_ref());
    settings.validate()?;

    let store = Arc::new(SupabaseStore::from_config(&settings)?);
    tracing::debug!("Player store endpoint: {}", store.endpoint());

    match &cli.command {
        Command::Import(args) => import(args, &settings, store).await,
        Command::List(args) => list(args, store.as_ref()).await,
        Command::Delete { id } => {
            store.delete(id).await?;
            println!("🗑️  Deleted player {}", id);
            Ok(0)
        }
    }
}

async fn import(
    args: &ImportArgs,
    settings: &Settings,
    store: Arc<SupabaseStore>,
) -> Result<i32, ImportError> {
    let storage = LocalStorage::new(".".to_string());
    let pipeline = SpreadsheetPipeline::new(storage.clone(), store, args.path.clone())
        .with_normalizer(RecordNormalizer::new(settings.field_mapper()?))
        .with_batch_size(settings.batch_size);

    let engine = ImportEngine::new_with_monitoring(pipeline, settings.monitor)
        .with_dry_run(settings.dry_run);
    let report = engine.run().await?;

    print_summary(&report);

    if let Some(report_path) = &settings.report_path {
        let json = serde_json::to_vec_pretty(&report)?;
        storage.write_file(report_path, &json).await?;
        tracing::info!("📁 Report saved to: {}", report_path);
    }

    if settings.strict && report.has_failures() {
        tracing::warn!("⚠️  {} batches failed in strict mode", report.failures.len());
        return Ok(2);
    }
    Ok(0)
}

fn print_summary(report: &ImportReport) {
    println!("📊 Rows read: {}", report.rows_read);
    println!("⏭️  Rows skipped (missing name): {}", report.rows_skipped);
    if report.malformed_fields > 0 {
        println!("⚠️  Fields left empty (invalid value): {}", report.malformed_fields);
    }
    if !report.duplicates.is_empty() {
        println!("👥 Possible duplicates: {}", report.duplicates.len());
    }

    if report.dry_run {
        println!(
            "🔍 DRY RUN - {} players would be imported",
            report.records_normalized
        );
        return;
    }

    println!("✅ Imported: {}", report.imported);
    if report.has_failures() {
        println!("❌ Failed: {}", report.failed);
        for failure in &report.failures {
            println!(
                "   batch {} (records {}-{}): {}",
                failure.batch, failure.first_record, failure.last_record, failure.reason
            );
        }
    }
}

async fn list<S: PlayerStore>(args: &ListArgs, store: &S) -> Result<i32, ImportError> {
    let filter = PlayerFilter {
        search_term: args.search.clone(),
        role: args.role.clone(),
    };
    let players = store.select_all(&filter).await?;

    for player in &players {
        let record = &player.record;
        println!(
            "{}\t{}\t{}\t{}",
            player.id,
            record.name,
            record.team.as_deref().unwrap_or("-"),
            record.general_role.as_deref().unwrap_or("-")
        );
    }
    println!("{} players", players.len());
    Ok(0)
}
