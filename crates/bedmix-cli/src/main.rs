//! CLI entry point.
//!
//! Loads `.env`, installs logging, composes the application via bootstrap
//! and routes the command to its handler.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use bedmix_cli::{Cli, CliConfig, CliError, Commands, ToolRequirement, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

const fn tool_requirement(command: &Commands) -> ToolRequirement {
    match command {
        Commands::Run { .. } | Commands::Resume { .. } => ToolRequirement::Required,
        Commands::Sessions | Commands::Delete { .. } | Commands::Prune => {
            ToolRequirement::NotNeeded
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::load(cli.data_dir)?;
    let ctx = bootstrap(config, tool_requirement(&command))?;

    match command {
        Commands::Run { music, speech } => handlers::run::execute(&ctx, music, speech).await,
        Commands::Resume { session_id } => handlers::resume::execute(&ctx, &session_id).await,
        Commands::Sessions => handlers::sessions::execute(&ctx).await,
        Commands::Delete { session_id } => handlers::delete::execute(&ctx, &session_id).await,
        Commands::Prune => handlers::prune::execute(&ctx).await,
    }
}

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        eprintln!("Error: {err}");
        std::process::exit(code);
    }
}
