// ABOUTME: CLI entrypoint for the bansync command
// ABOUTME: Loads .env, sets up logging, runs one export and maps errors to exit codes

use bansync::{
    api::ApiClient, auth::resolve_api_key, cli::Cli, paginate::ThreadSleeper, sync::sync_bans,
    Result,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    // A missing .env is fine; the key may come from the flag or environment.
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("bansync: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

/// `RUST_LOG` (environment or `.env`) wins over the verbosity flag.
fn log_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "bansync=info" } else { "bansync=warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let api_key = resolve_api_key(cli.api_key.clone())?;
    let client = ApiClient::new(api_key, Some(cli.api_base.clone()))?.with_page_size(cli.page_size);
    let config = cli.sync_config();

    println!("Querying all bans...");
    let report = sync_bans(&client, &ThreadSleeper, &config)?;

    println!(
        "Finished querying bans! Total ban count: {}",
        report.new_records
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_log_filter_reads_rust_log_from_env_file() {
        let temp = TempDir::new().unwrap();
        let env_file = temp.path().join(".env");
        fs::write(&env_file, "RUST_LOG=bansync=trace\n").unwrap();

        std::env::remove_var("RUST_LOG");
        assert_eq!(log_filter(false).to_string(), "bansync=warn");

        dotenv::from_path(&env_file).unwrap();
        assert_eq!(log_filter(false).to_string(), "bansync=trace");

        std::env::remove_var("RUST_LOG");
    }
}
