use std::process::ExitCode;

use clap::Parser;
use proxy_scripts::cli::Cli;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit with the same status as failed scripts
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .pretty()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run().await {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
