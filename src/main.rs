//! Euroleague CLI binary entry point.

use std::time::Duration;

use clap::Parser;
use euroleague::cli::{AuthCommands, Cli, Commands, GetArgs};
use euroleague::http::ApiRequest;
use euroleague::util::cancel::Cancellation;
use euroleague::EuroleagueClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = EuroleagueClient::from_env()?;

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                euroleague::cli::auth::handle_login(&client, args.scope.as_deref()).await
            }
            AuthCommands::Status => euroleague::cli::auth::handle_status(&client),
            AuthCommands::Logout => euroleague::cli::auth::handle_logout(&client),
        },
        Commands::Get(args) => handle_get(&client, args).await,
    };

    client.close();
    result
}

async fn handle_get(
    client: &EuroleagueClient,
    args: GetArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ApiRequest::get(args.path).extend_query(args.query);
    let cancel = match args.deadline {
        Some(secs) => Cancellation::new().with_timeout(Duration::from_secs(secs)),
        None => Cancellation::new(),
    };

    let response = client.execute_with(&request, &cancel).await?;
    let rendered = if args.compact {
        serde_json::to_string(&response.body)?
    } else {
        serde_json::to_string_pretty(&response.body)?
    };
    println!("{rendered}");
    Ok(())
}
