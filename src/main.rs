use clap::Parser;
use ragchat::cli::{commands::Cli, run_cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    run_cli(cli.command, cli.config).await;
}
