// Discord adapter
//
// poise framework setup, shared command state and the reminder delivery sink.

pub mod commands;
pub mod events;
pub mod format;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::constants::{
    AUDIT_DIR, MEMBERS_FILE, OFFENSES_FILE, OFFENSE_MESSAGES_FILE, REMINDERS_FILE, ROLE_MENUS_FILE,
};
use crate::config::Config;
use crate::logging::AuditLogger;
use crate::members::MemberDirectory;
use crate::moderation::{Moderator, OffenseArchive, OffenseLedger};
use crate::openai::{CompletionProvider, OpenAiClient};
use crate::reminders::{Reminder, ReminderQueue, ReminderScheduler, ReminderSink};
use crate::rolemenus::RoleMenuStore;

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Every persisted store under `data_dir`
pub struct Stores {
    pub ledger: Arc<OffenseLedger>,
    pub archive: Arc<OffenseArchive>,
    pub members: MemberDirectory,
    pub reminders: Arc<ReminderQueue>,
    pub role_menus: RoleMenuStore,
    pub audit: Arc<AuditLogger>,
}

impl Stores {
    pub async fn open(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", config.data_dir.display())
        })?;

        Ok(Self {
            ledger: Arc::new(OffenseLedger::open(config.data_path(OFFENSES_FILE))?),
            archive: Arc::new(OffenseArchive::open(config.data_path(OFFENSE_MESSAGES_FILE))?),
            members: MemberDirectory::open(config.data_path(MEMBERS_FILE))?,
            reminders: Arc::new(ReminderQueue::open(config.data_path(REMINDERS_FILE)).await?),
            role_menus: RoleMenuStore::open(config.data_path(ROLE_MENUS_FILE))?,
            audit: Arc::new(AuditLogger::new(config.data_path(AUDIT_DIR))?),
        })
    }
}

/// State shared by every command and event
pub struct Data {
    pub config: RwLock<Config>,
    pub config_path: PathBuf,
    pub moderator: Moderator,
    pub members: MemberDirectory,
    pub reminders: Arc<ReminderQueue>,
    pub role_menus: RoleMenuStore,
    pub completions: Arc<dyn CompletionProvider>,
    pub audit: Arc<AuditLogger>,
    pub scheduler: Arc<ReminderScheduler>,
    pub scheduler_started: AtomicBool,
}

impl Data {
    pub fn ledger(&self) -> &OffenseLedger {
        self.moderator.ledger()
    }

    pub fn archive(&self) -> &OffenseArchive {
        self.moderator.archive()
    }

    pub async fn is_sudo(&self, user_id: serenity::UserId) -> bool {
        self.config.read().await.is_sudo(user_id.get())
    }
}

/// Posts fired reminders back to the channel they were set in
pub struct DiscordReminderSink {
    http: Arc<serenity::Http>,
}

impl DiscordReminderSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReminderSink for DiscordReminderSink {
    async fn deliver(&self, reminder: &Reminder) -> Result<()> {
        serenity::ChannelId::new(reminder.channel_id)
            .say(
                &*self.http,
                format!("<@{}> Reminder: {}", reminder.user_id, reminder.message),
            )
            .await
            .with_context(|| format!("Failed to post reminder {} to channel {}", reminder.id, reminder.channel_id))?;
        Ok(())
    }
}

/// Fails the command unless the author is in `sudo`
pub async fn is_sudo(ctx: Context<'_>) -> Result<bool, Error> {
    if ctx.data().is_sudo(ctx.author().id).await {
        return Ok(true);
    }
    ctx.say("You do not have permission to use this command.").await?;
    Ok(false)
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!(error = %error, "Framework setup failed");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(command = %ctx.command().qualified_name, error = %error, "Command failed");
            if let Err(e) = ctx.say("Sorry, something went wrong running that command.").await {
                warn!(error = %e, "Failed to report command error");
            }
        }
        poise::FrameworkError::CommandCheckFailed { error: Some(error), ctx, .. } => {
            error!(command = %ctx.command().qualified_name, error = %error, "Command check failed");
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                warn!(error = %e, "Error while handling framework error");
            }
        }
    }
}

/// Connect to Discord and serve until the gateway closes or Ctrl-C
pub async fn run(config: Config, config_path: PathBuf) -> Result<()> {
    let stores = Stores::open(&config).await?;

    let openai = Arc::new(OpenAiClient::new(&config.openai)?);
    if !openai.is_configured() {
        warn!("No OpenAI API key configured; moderation and AI commands are disabled");
    }

    let moderator = Moderator::new(openai.clone(), stores.ledger.clone(), stores.archive.clone())
        .with_audit(stores.audit.clone());

    let http = Arc::new(serenity::Http::new(&config.discord_token));
    let scheduler = Arc::new(
        ReminderScheduler::new(
            stores.reminders.clone(),
            Arc::new(DiscordReminderSink::new(http)),
            Duration::from_secs(config.reminders.poll_interval_secs),
        )
        .with_audit(stores.audit.clone()),
    );

    let token = config.discord_token.clone();
    let prefix = config.prefix.clone();
    let data = Data {
        config: RwLock::new(config),
        config_path,
        moderator,
        members: stores.members,
        reminders: stores.reminders,
        role_menus: stores.role_menus,
        completions: openai,
        audit: stores.audit,
        scheduler: scheduler.clone(),
        scheduler_started: AtomicBool::new(false),
    };

    let options = poise::FrameworkOptions {
        commands: commands::all(),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(prefix),
            mention_as_prefix: false,
            ..Default::default()
        },
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, framework, data| {
            Box::pin(events::handle_event(ctx, event, framework, data))
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(options)
        .setup(|_ctx, ready, _framework| {
            Box::pin(async move {
                info!(user = %ready.user.name, "Framework ready");
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Failed to create Discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });

    let result = client.start().await.context("Discord client stopped with an error");
    scheduler.stop();
    info!("Bot stopped");
    result
}
