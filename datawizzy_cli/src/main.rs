use anyhow::Result;
use clap::Parser;
use datawizzy_core::{Assistant, Conversation, ProviderConfig, ResponseMode};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "datawizzy")]
#[command(about = "Chat assistant for data-science questions")]
#[command(version)]
struct Cli {
    /// Your data science question
    #[arg(short, long)]
    query: String,

    /// Path to a JSON config file (defaults to the user config directory,
    /// then environment variables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Conversation log to load before the turn and save afterwards
    #[arg(long)]
    log: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let config = ProviderConfig::resolve(cli.config.as_deref()).await?;
    let assistant = Assistant::from_config(&config)?;
    tracing::debug!(provider = assistant.provider_name(), "Assistant ready");

    let mut conversation = match &cli.log {
        Some(path) if path.exists() => Conversation::load(path).await?,
        _ => Conversation::new(),
    };

    let reply = assistant
        .respond(&mut conversation, &cli.query, ResponseMode::Concise)
        .await?;
    println!("{reply}");

    if ask_for_more_detail()? {
        let detailed = assistant
            .respond(&mut conversation, &cli.query, ResponseMode::Detailed)
            .await?;
        println!("{detailed}");
    }

    if let Some(path) = &cli.log {
        conversation.save(path).await?;
    }

    Ok(())
}

fn ask_for_more_detail() -> Result<bool> {
    print!("Do you need more detailed information? (yes/no) ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "yes" || answer == "y")
}
