use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "scout-import")]
#[command(about = "Import scouted players from a spreadsheet into the player store")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Path to TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Player store URL (defaults to SUPABASE_URL)
    #[arg(long, global = true)]
    pub store_url: Option<String>,

    /// Player store access key (defaults to SUPABASE_ANON_KEY)
    #[arg(long, global = true)]
    pub store_key: Option<String>,

    /// Table holding the players
    #[arg(long, global = true)]
    pub table: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import players from a spreadsheet (.xlsx, .xls, .ods or .csv)
    Import(ImportArgs),
    /// List stored players
    List(ListArgs),
    /// Delete a stored player by id
    Delete { id: String },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ImportArgs {
    /// Spreadsheet to import (first sheet only)
    pub path: String,

    /// Records per insert request
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Read and normalize only, do not write to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with a non-zero code when any batch fails
    #[arg(long)]
    pub strict: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    /// Write the import report as JSON to this path
    #[arg(long)]
    pub report: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Case-insensitive match on name or team
    #[arg(long)]
    pub search: Option<String>,

    /// Exact match on general role
    #[arg(long)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_command() {
        let cli = CliConfig::try_parse_from([
            "scout-import",
            "import",
            "../DATABASE.xlsx",
            "--batch-size",
            "20",
            "--dry-run",
            "--store-url",
            "http://localhost:54321",
        ])
        .unwrap();

        assert_eq!(cli.store_url.as_deref(), Some("http://localhost:54321"));
        match cli.command {
            Command::Import(args) => {
                assert_eq!(args.path, "../DATABASE.xlsx");
                assert_eq!(args.batch_size, Some(20));
                assert!(args.dry_run);
                assert!(!args.strict);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_import_requires_path() {
        assert!(CliConfig::try_parse_from(["scout-import", "import"]).is_err());
    }

    #[test]
    fn test_parse_list_command() {
        let cli =
            CliConfig::try_parse_from(["scout-import", "list", "--search", "rossi", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::List(ListArgs { search: Some(_), role: None })));
    }
}
