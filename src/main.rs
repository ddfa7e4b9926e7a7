// HedgeBot - Discord moderation and utility bot
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hedgebot::bot::{self, Stores};
use hedgebot::config::{default_config_path, load_config, write_starter_config};
use hedgebot::logging::init_tracing;
use hedgebot::openai::OpenAiClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Discord moderation and utility bot", long_about = None)]
struct Cli {
    /// Config file (default: ~/.hedgebot/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for hedgebot
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to Discord and start moderating (default)
    Run,
    /// Write a starter config file
    Init {
        /// Discord bot token
        #[arg(long)]
        token: String,
        /// First channel to monitor
        #[arg(long)]
        channel: u64,
    },
    /// Validate the config and open every data file
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let (config, path) = load_config(cli.config.as_deref())?;
            init_tracing(cli.verbose || config.features.debug_logging);
            tracing::info!(config = %path.display(), channels = config.channels.len(), "Starting HedgeBot");
            bot::run(config, path).await
        }
        Command::Init { token, channel } => {
            let path = match cli.config {
                Some(path) => path,
                None => default_config_path()?,
            };
            let config = write_starter_config(&path, &token, channel)?;
            println!("✓ Wrote {}", path.display());
            println!("  Monitoring channel {}", channel);
            println!("  Data directory: {}", config.data_dir.display());
            println!();
            println!("Add your user id to `sudo` for admin commands, then run `hedgebot run`.");
            Ok(())
        }
        Command::Check => {
            init_tracing(cli.verbose);
            let (config, path) = load_config(cli.config.as_deref())?;
            let stores = Stores::open(&config).await?;
            let openai = OpenAiClient::new(&config.openai)?;

            println!("✓ Config OK: {}", path.display());
            println!("  Prefix: {}", config.prefix);
            println!("  Monitored channels: {}", config.channels.len());
            println!("  Sudo users: {}", config.sudo.len());
            println!(
                "  OpenAI: {}",
                if openai.is_configured() { "configured" } else { "no API key" }
            );
            println!("✓ Data directory: {}", config.data_dir.display());
            println!("  Users with offenses: {}", stores.ledger.all().await.len());
            println!("  Member records: {}", stores.members.usernames().await.len());
            println!("  Pending reminders: {}", stores.reminders.len().await);
            println!("  Role menus: {}", stores.role_menus.len().await);
            Ok(())
        }
    }
}
