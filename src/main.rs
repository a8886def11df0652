use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::time::Duration;

use gatekeeper_bot::application::messaging::MessageParser;
use gatekeeper_bot::application::services::SessionService;
use gatekeeper_bot::domain::traits::{Bot, UserStore};
use gatekeeper_bot::infrastructure::adapters::console::{ConsoleAdapter, CONSOLE_IDENTITY};
use gatekeeper_bot::infrastructure::adapters::telegram::TelegramAdapter;
use gatekeeper_bot::infrastructure::config::Config;
use gatekeeper_bot::infrastructure::database::SqliteStore;
use gatekeeper_bot::infrastructure::storage::MemoryStore;

#[derive(Parser)]
#[command(name = "gatekeeper-bot")]
#[command(about = "A password-gated chat bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config, cli.token);
        }
        Commands::Version => {
            println!("gatekeeper-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_bot(config_path: String, token_override: Option<String>) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting {}", config.bot.name);

    // Pick the record store
    let store: Arc<dyn UserStore> = match &config.storage.database {
        Some(path) => match SqliteStore::open(path) {
            Ok(store) => {
                tracing::info!("Database initialized at {}", path.display());
                Arc::new(store)
            }
            Err(e) => {
                tracing::error!("Failed to open database: {}", e);
                return;
            }
        },
        None => {
            tracing::warn!("No database configured; records will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let sessions = SessionService::new(store);
    let parser = MessageParser::new(&config.bot.prefix);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return;
        }
    };

    let token = token_override.or_else(|| {
        config
            .adapters
            .telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.clone())
    });

    if let Some(token) = token {
        rt.block_on(async {
            let mut bot = TelegramAdapter::new(token, &config.bot.name);
            run_telegram_bot(&mut bot, &parser, &sessions).await;
        });
    } else {
        // Run console bot (dev mode)
        rt.block_on(async {
            let bot = ConsoleAdapter::new(&config.bot.name);
            run_console_bot(&bot, &parser, &sessions).await;
        });
    }
}

async fn run_telegram_bot(bot: &mut TelegramAdapter, parser: &MessageParser, sessions: &SessionService) {
    if let Err(e) = bot.fetch_bot_info().await {
        tracing::warn!("Failed to fetch bot info: {}", e);
    }
    if let Err(e) = bot.register_commands().await {
        tracing::warn!("Failed to register commands: {}", e);
    }
    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        return;
    }
    tracing::info!("Bot {} is polling for updates", bot.bot_info().name);

    let mut offset = 0i64;
    loop {
        let updates = match bot.get_updates(offset, 30).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}", e);
                tokio::time::sleep(Duration::from_secs(3)).await;
                continue;
            }
        };

        if !updates.is_empty() {
            offset = TelegramAdapter::get_next_offset(&updates);
        }

        for update in updates {
            let Some(message) = update.message else { continue };
            let Some(text) = message.text.clone() else { continue };
            let identity = message.chat.id.to_string();

            let mut event = parser.parse(&identity, text);
            if let Ok(raw) = serde_json::to_value(&message) {
                event = event.with_raw(raw);
            }
            match sessions.handle(&event).await {
                Ok(reply) => {
                    if let Err(e) = bot.send_reply(&identity, &reply).await {
                        tracing::error!("Failed to reply to {}: {}", identity, e);
                    }
                }
                Err(e) => {
                    // Store failure; cannot answer safely without the record.
                    tracing::error!("Event handling failed for {}: {}", identity, e);
                }
            }
        }
    }
}

async fn run_console_bot(bot: &ConsoleAdapter, parser: &MessageParser, sessions: &SessionService) {
    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        return;
    }
    println!("Console mode. Type /help for commands, Ctrl-D to exit.");

    loop {
        // Empty lines go through: while registering they count as an
        // (invalid) empty password attempt.
        let Some(line) = bot.read_line("you> ").await else {
            break;
        };

        let event = parser.parse(CONSOLE_IDENTITY, line);
        match sessions.handle(&event).await {
            Ok(reply) => {
                if let Err(e) = bot.send_reply(CONSOLE_IDENTITY, &reply).await {
                    tracing::error!("Failed to reply: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Event handling failed: {}", e);
            }
        }
    }
}

fn init_config() {
    let path = "config.yaml";
    if std::path::Path::new(path).exists() {
        tracing::warn!("{} already exists, not overwriting", path);
        return;
    }

    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            if let Err(e) = std::fs::write(path, yaml) {
                tracing::error!("Failed to write {}: {}", path, e);
            } else {
                println!("Wrote default config to {}", path);
            }
        }
        Err(e) => tracing::error!("Failed to serialize default config: {}", e),
    }
}
