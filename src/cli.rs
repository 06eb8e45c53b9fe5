// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Universe selection, output path, sync mode and API overrides

use crate::api::{DEFAULT_API_BASE, DEFAULT_PAGE_SIZE};
use crate::storage::ExportPaths;
use crate::sync::{SyncConfig, SyncMode};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bansync")]
#[command(about = "Export and incrementally resync experience bans to CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Universe ID to export bans for
    #[arg(long, short)]
    pub universe: String,

    /// Output CSV path [default: <universe>-bans.csv]
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Ignore any previous export and fetch every ban
    #[arg(long)]
    pub full: bool,

    /// Fail when bans are not returned newest-first
    #[arg(long)]
    pub strict_order: bool,

    /// API key (overrides API_KEY env/.env)
    #[arg(long)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Restrictions requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: u32,

    /// Log progress details
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    pub fn sync_config(&self) -> SyncConfig {
        let paths = ExportPaths::new(&self.universe, self.output.clone());
        let mut config = SyncConfig::new(self.universe.clone(), paths);
        config.mode = if self.full {
            SyncMode::Full
        } else {
            SyncMode::Incremental
        };
        config.strict_order = self.strict_order;
        config.show_progress = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["bansync", "--universe", "123"]).unwrap();
        assert_eq!(cli.api_base, DEFAULT_API_BASE);
        assert_eq!(cli.page_size, 100);

        let config = cli.sync_config();
        assert_eq!(config.mode, SyncMode::Incremental);
        assert_eq!(config.paths.output, PathBuf::from("123-bans.csv"));
    }

    #[test]
    fn test_cli_full_and_output() {
        let cli = Cli::try_parse_from([
            "bansync",
            "-u",
            "9",
            "--full",
            "--strict-order",
            "--output",
            "/tmp/x.csv",
        ])
        .unwrap();

        let config = cli.sync_config();
        assert_eq!(config.mode, SyncMode::Full);
        assert!(config.strict_order);
        assert_eq!(config.paths.tmp, PathBuf::from("/tmp/x.csv.tmp"));
    }

    #[test]
    fn test_cli_rejects_bad_page_size() {
        assert!(Cli::try_parse_from(["bansync", "-u", "1", "--page-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["bansync", "-u", "1", "--page-size", "500"]).is_err());
    }

    #[test]
    fn test_cli_requires_universe() {
        assert!(Cli::try_parse_from(["bansync"]).is_err());
    }
}
