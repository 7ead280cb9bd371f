use anyhow::Result;
use clap::Parser;
use docqa_cli::repl::{run_ask, run_chat};
use docqa_cli::{Cli, Commands, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match cli.command {
        Commands::Ask(args) => run_ask(args).await,
        Commands::Chat(args) => run_chat(args).await,
    }
}
