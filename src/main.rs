//! Salamat CLI - pharmacy assistant.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use clap::{Args, Parser, Subcommand};
use salamat_bot::agent::Orchestrator;
use salamat_bot::config::{self, AGENT_PROMPT, BotConfig};
use salamat_bot::db::{Database, FeedImporter};
use salamat_bot::error::{AgentError, BotError, Result};
use salamat_bot::index::{KeywordIndex, ProductIndex};
use salamat_bot::model::OpenAiModel;
use salamat_bot::session::{FileStorage, SessionManager};
use salamat_bot::tools;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Salamat - pharmacy assistant with catalog search and ordering
#[derive(Parser)]
#[command(name = "salamat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "SALAMAT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init(InitArgs),

    /// Start an interactive chat session
    Chat(ChatArgs),

    /// Import the supplier feed into the catalog
    Import(ImportArgs),

    /// Show status and configuration
    Status,
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the chat command
#[derive(Args)]
struct ChatArgs {
    /// Single message to send instead of an interactive session
    #[arg(short, long)]
    message: Option<String>,

    /// Session key for conversation persistence
    #[arg(short, long, default_value = "cli")]
    session: String,

    /// Override the reasoning step limit
    #[arg(short, long)]
    limit: Option<usize>,
}

/// Arguments for the import command
#[derive(Args)]
struct ImportArgs {
    /// Feed URL (overrides config)
    #[arg(short, long)]
    url: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "salamat_bot={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => cmd_init(args).await,
        Commands::Chat(args) => cmd_chat(args, cli.config).await,
        Commands::Import(args) => cmd_import(args, cli.config).await,
        Commands::Status => cmd_status(cli.config).await,
    }
}

/// Load config from an explicit path or the default location.
async fn load(config_path: Option<PathBuf>) -> Result<BotConfig> {
    let config = match config_path {
        Some(path) => config::load_config_from(&path).await?,
        None => config::load_config().await?,
    };
    Ok(config)
}

/// Initialize configuration.
async fn cmd_init(args: InitArgs) -> Result<()> {
    let config_file = config::config_path();

    if config_file.exists() && !args.force {
        println!("Configuration already exists at: {}", config_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    config::init_config().await?;

    println!("Configuration created: {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. export OPENAI_API_KEY=<key>");
    println!("  2. salamat import");
    println!("  3. salamat chat");

    Ok(())
}

/// Start interactive chat.
async fn cmd_chat(args: ChatArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = load(config_path).await?;
    let api_key = BotConfig::api_key()?;
    if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
        config.llm.base_url = base_url;
    }

    let db = Database::open(&config.db_path())?;
    let index = Arc::new(KeywordIndex::default());
    index.rebuild(&db.all_products().await?).await;

    let registry = Arc::new(tools::registry(db, index));
    let sessions = SessionManager::new(Arc::new(FileStorage::new(config.session_dir())));
    let model = OpenAiModel::from_config(&config.llm, api_key);

    let limit = args.limit.unwrap_or(config.agent.recursion_limit);
    let orchestrator = Orchestrator::new(model, registry, sessions, AGENT_PROMPT)
        .with_recursion_limit(limit);

    let timeout = Duration::from_secs(config.agent.message_timeout_secs);

    if let Some(message) = args.message {
        println!("You: {message}");
        let answer = run_one(&orchestrator, &args.session, &message, timeout).await?;
        println!("Bot: {answer}");
        return Ok(());
    }

    println!("Salamat Chat | type 'exit' to quit\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush().map_err(BotError::Io)?;

        let Some(line) = lines.next_line().await.map_err(BotError::Io)? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match run_one(&orchestrator, &args.session, line, timeout).await {
            Ok(answer) => println!("Bot: {answer}\n"),
            Err(e) if e.kind() == "cancelled" => {
                println!("\nInterrupted.");
                break;
            }
            Err(e) => println!("error ({}): {e}\n", e.kind()),
        }
    }

    Ok(())
}

/// Run a single user message with timeout and Ctrl+C cancellation.
async fn run_one(
    orchestrator: &Orchestrator<OpenAiModel>,
    session: &str,
    message: &str,
    timeout: Duration,
) -> Result<String> {
    let cancel = CancellationToken::new();

    tokio::select! {
        result = tokio::time::timeout(
            timeout,
            orchestrator.run_cancellable(session, message, &cancel),
        ) => match result {
            Ok(answer) => answer,
            Err(_) => Err(AgentError::Timeout(timeout.as_secs()).into()),
        },
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            Err(AgentError::Cancelled.into())
        }
    }
}

/// Import the supplier feed.
async fn cmd_import(args: ImportArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load(config_path).await?;
    let url = args.url.unwrap_or(config.feed.url.clone());

    let db = Database::open(&config.db_path())?;
    let importer = FeedImporter::new(url);

    println!("Importing feed...");
    let added = importer.run(&db).await?;

    let (products, pharmacies, links) = db.stats().await?;
    println!("Added {added} price links.");
    println!("Catalog: {products} products, {pharmacies} pharmacies, {links} links.");

    Ok(())
}

/// Show status.
async fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.clone().unwrap_or_else(config::config_path);

    println!("Salamat Status\n");

    println!("Configuration:");
    println!("  Path:   {}", config_file.display());
    println!(
        "  Exists: {}",
        if config_file.exists() { "yes" } else { "no" }
    );

    match load(config_path).await {
        Ok(config) => {
            println!("  Valid:  yes");
            println!();
            println!("Agent:");
            println!("  Model:           {}", config.llm.model);
            println!("  Recursion limit: {}", config.agent.recursion_limit);
            println!("  Feed URL:        {}", config.feed.url);

            let db_path = config.db_path();
            println!();
            println!("Catalog:");
            println!("  Path:   {}", db_path.display());
            if db_path.exists() {
                let db = Database::open(&db_path)?;
                let (products, pharmacies, links) = db.stats().await?;
                println!("  Rows:   {products} products, {pharmacies} pharmacies, {links} links");
            } else {
                println!("  Rows:   (not created yet, run 'salamat import')");
            }
        }
        Err(e) => {
            println!("  Valid:  no ({e})");
        }
    }

    println!();
    println!("Environment:");
    print_env_status("OPENAI_API_KEY");
    print_env_status("SALAMAT_CONFIG");

    Ok(())
}

/// Print environment variable status.
fn print_env_status(name: &str) {
    let status = if std::env::var(name).is_ok() {
        "set"
    } else {
        "-"
    };
    println!("  {name}: {status}");
}
