use anyhow::Result;
use clap::Parser;
use datebook::cli::{Cli, CliHandler, Commands};
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let command = cli.command.unwrap_or(Commands::Show {
        view: "month".to_string(),
        date: None,
    });
    let today = chrono::Local::now().date_naive();

    let handler = CliHandler::new(&cli.user, cli.data_file, today).await?;
    handler.handle_command(command).await
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    // Logs go to stderr so the rendered calendar stays clean on stdout
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
