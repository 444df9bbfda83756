use std::process::ExitCode;

mod cli;
use cli::{CliMode, parse_cli_args, run_insert, run_list, usage};

use gcal_up::storage::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    setup_logging();

    let options = match parse_cli_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", usage());
            return ExitCode::from(2);
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {}", err);
            tracing::error!("Configuration error: {}", err);
            return ExitCode::from(2);
        }
    };

    let result = match options.mode {
        CliMode::List => run_list(config, options.token_file).await,
        CliMode::Insert => run_insert(config, options.token_file).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            tracing::error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
