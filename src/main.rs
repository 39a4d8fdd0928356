mod cli;

use clap::Parser;
use serde_json::{Value, json};
use std::error::Error;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use unifile::config::Config;
use unifile::handlers::{Content, TargetType, WriteOption};
use unifile::{FileManager, ManagedPool, Outcome};

type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> CliResult {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path.clone())?,
        None => Config::load()?,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Runtime sized by the [pool] section, shut down before exit
    let managed = ManagedPool::new(&config.pool)?;
    let manager = FileManager::from_config(&config, managed.pool())?;
    let result = managed.pool().block_on(run(cli.command, &manager));
    managed.shutdown(SHUTDOWN_TIMEOUT);

    result?
}

async fn run(command: Commands, manager: &FileManager) -> CliResult {
    match command {
        Commands::Read(args) => {
            let target = TargetType::from(args.target);
            let requests = args
                .paths
                .iter()
                .map(|path| (path.clone(), target.clone()))
                .collect();
            let tolerate = !args.fail_fast && manager.default_tolerance();

            let outcomes = manager.read_many(requests, tolerate).await?;
            for path in &args.paths {
                if let Some(outcome) = outcomes.get(path) {
                    println!("{}", render(path, outcome));
                }
            }
        }
        Commands::Write(args) => {
            let option = args.mode().map(WriteOption::from).unwrap_or_default();
            manager
                .write(&args.path, Content::Text(args.content), option)?
                .await?;
            println!("{}", json!({"path": args.path.display().to_string(), "status": "written"}));
        }
        Commands::Formats => {
            for handler in manager.registry().handlers() {
                let line = json!({
                    "format": handler.format(),
                    "capability": handler.capability(),
                    "extensions": handler.extensions().iter().collect::<Vec<_>>(),
                    "write_option": handler.write_option_kind(),
                });
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn render(path: &str, outcome: &Outcome<Content>) -> Value {
    match outcome {
        Outcome::Success(Content::Text(text)) => {
            json!({"path": path, "status": "success", "content": text})
        }
        Outcome::Success(Content::Object(value)) => {
            json!({"path": path, "status": "success", "content": value})
        }
        Outcome::Success(Content::Bytes(bytes)) => {
            json!({"path": path, "status": "success", "bytes": bytes.len()})
        }
        Outcome::Failure(err) => {
            json!({"path": path, "status": "failure", "error": err.to_string()})
        }
    }
}
