use std::process::ExitCode;

use apikit_cli::{init_tracing, run, Cli};
use apikit_http::ApiResponse;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await? {
        ApiResponse::Success { data } => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(ExitCode::SUCCESS)
        }
        ApiResponse::Error { error } => {
            eprintln!("{} error: {}", error.kind(), error.message());
            if let Some(body) = error.body() {
                eprintln!("{}", serde_json::to_string_pretty(body)?);
            }
            Ok(ExitCode::FAILURE)
        }
        ApiResponse::Loading => Ok(ExitCode::FAILURE),
    }
}
