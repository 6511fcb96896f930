mod error;
mod format;
mod models;
mod repository;
mod shell;
mod tui;

use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repository::{InMemoryTopicRepositoryFactory, UserTopicRepositories};
use shell::Shell;

const DEFAULT_USER: &str = "default";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "memflow")]
#[command(about = "A spaced-repetition reminder list for topics you want to keep fresh")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// User whose topics to open (defaults to $MEMFLOW_USER)
    #[arg(long, short, global = true)]
    user: Option<String>,

    /// Log filter, e.g. "debug" or "memflow=trace" (defaults to $MEMFLOW_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive line shell (default)
    Shell,

    /// Launch interactive terminal UI
    Tui,
}

fn get_default_user() -> String {
    match std::env::var("MEMFLOW_USER") {
        Ok(user) if !user.is_empty() => user,
        _ => DEFAULT_USER.to_string(),
    }
}

fn get_log_filter(flag: Option<&str>) -> String {
    if let Some(filter) = flag {
        return filter.to_string();
    }
    std::env::var("MEMFLOW_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let user = cli.user.clone().unwrap_or_else(get_default_user);
    let users = UserTopicRepositories::new(Arc::new(InMemoryTopicRepositoryFactory::new()));

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            init_logging(&get_log_filter(cli.log_level.as_deref()));
            tracing::info!(user = %user, json = cli.json, "starting shell");

            let mut shell = Shell::new(&users, &user, cli.json);
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            shell.run(stdin.lock(), &mut stdout)?;
            tracing::info!(user = %shell.user(), "shell closed");
        }

        // No subscriber here: log lines on stderr would tear the alternate screen
        Commands::Tui => {
            tui::run(users.get_or_create(&user), &user)?;
        }
    }

    Ok(())
}
