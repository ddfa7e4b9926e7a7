// Offense listings, monitored channel management and history rescans

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

use super::{bot_embed, fetch_history};
use crate::bot::format::{offense_lines, scan_preview, truncate_chars, user_offense_report, EMBED_FIELD_LIMIT};
use crate::bot::{is_sudo, Context, Error};
use crate::config::save_config;
use crate::logging::AuditEvent;
use crate::moderation::ModerationOutcome;

/// Embeds hold at most 25 fields
const MAX_EMBED_FIELDS: usize = 25;
/// Archived messages shown by `offenses_user`
const RECENT_OFFENSES_SHOWN: usize = 5;

/// List all users and their offenses
#[poise::command(prefix_command, category = "Moderation")]
pub async fn offenses(ctx: Context<'_>) -> Result<(), Error> {
    let all = ctx.data().ledger().all().await;
    if all.is_empty() {
        ctx.say("No offenses recorded.").await?;
        return Ok(());
    }

    let mut embed = bot_embed("User Offenses", serenity::Colour::RED)
        .description("List of users and their offenses:");
    for (username, counts) in all.iter().take(MAX_EMBED_FIELDS) {
        embed = embed.field(
            username.clone(),
            truncate_chars(&offense_lines(counts), EMBED_FIELD_LIMIT, "\n..."),
            false,
        );
    }
    if all.len() > MAX_EMBED_FIELDS {
        embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
            "Showing {} of {} users. Use !offenses_user <username> for the rest.",
            MAX_EMBED_FIELDS,
            all.len()
        )));
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Offense counts and recent flagged messages for one user
#[poise::command(prefix_command, category = "Moderation")]
pub async fn offenses_user(ctx: Context<'_>, username: String) -> Result<(), Error> {
    let Some(counts) = ctx.data().ledger().for_user(&username).await else {
        ctx.say(format!("No offenses recorded for user: {}", username)).await?;
        return Ok(());
    };
    let recent = ctx.data().archive().recent(&username, RECENT_OFFENSES_SHOWN).await;

    let embed = bot_embed(format!("Offenses for {}", username), serenity::Colour::RED)
        .description(user_offense_report(&counts, &recent));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Add a channel to the monitored channels (sudo)
#[poise::command(prefix_command, check = "is_sudo", category = "Moderation")]
pub async fn add_channel(ctx: Context<'_>, channel_id: u64) -> Result<(), Error> {
    let data = ctx.data();
    let mut config = data.config.write().await;
    if !config.add_channel(channel_id) {
        drop(config);
        ctx.say(format!("Channel {} is already in the monitored channels.", channel_id))
            .await?;
        return Ok(());
    }

    if let Err(e) = save_config(&data.config_path, &config) {
        config.remove_channel(channel_id);
        drop(config);
        error!(channel_id, error = %e, "Failed to persist monitored channels");
        ctx.say("Failed to save the configuration; the channel was not added.")
            .await?;
        return Ok(());
    }
    drop(config);

    data.audit.record(AuditEvent::ChannelAdded {
        channel_id,
        by: ctx.author().id.get(),
    });
    info!(channel_id, "Monitored channel added");
    ctx.say(format!("Channel {} added to the monitored channels.", channel_id))
        .await?;
    Ok(())
}

/// Remove a channel from the monitored channels (sudo)
#[poise::command(prefix_command, check = "is_sudo", category = "Moderation")]
pub async fn remove_channel(ctx: Context<'_>, channel_id: u64) -> Result<(), Error> {
    let data = ctx.data();
    let mut config = data.config.write().await;
    if !config.remove_channel(channel_id) {
        drop(config);
        ctx.say(format!("Channel {} is not in the monitored channels.", channel_id))
            .await?;
        return Ok(());
    }

    if let Err(e) = save_config(&data.config_path, &config) {
        config.add_channel(channel_id);
        drop(config);
        error!(channel_id, error = %e, "Failed to persist monitored channels");
        ctx.say("Failed to save the configuration; the channel was not removed.")
            .await?;
        return Ok(());
    }
    drop(config);

    data.audit.record(AuditEvent::ChannelRemoved {
        channel_id,
        by: ctx.author().id.get(),
    });
    info!(channel_id, "Monitored channel removed");
    ctx.say(format!("Channel {} removed from the monitored channels.", channel_id))
        .await?;
    Ok(())
}

/// Rebuild the offense records from the last N messages of every monitored channel (sudo)
#[poise::command(prefix_command, check = "is_sudo", category = "Moderation")]
pub async fn scan_history(ctx: Context<'_>, quantity: usize) -> Result<(), Error> {
    let data = ctx.data();
    let by = ctx.author().id.get();

    data.ledger().clear().await.context("Failed to clear offense ledger")?;
    data.archive().clear().await.context("Failed to clear offense archive")?;
    data.audit.record(AuditEvent::LedgerCleared { by });
    ctx.say("Cleared previous moderation records. Beginning history scan...")
        .await?;

    let channels = data.config.read().await.channels.clone();
    let mut processed: Vec<String> = Vec::new();
    let mut flagged = 0;

    for channel_id in channels {
        let channel = serenity::ChannelId::new(channel_id);
        let mut history = match fetch_history(ctx.http(), channel, quantity, |_| true).await {
            Ok(history) => history,
            Err(e) => {
                warn!(channel_id, error = %e, "Failed to read channel history");
                ctx.say(format!("Could not read channel with ID {}", channel_id))
                    .await?;
                continue;
            }
        };
        ctx.say(format!("Scanning channel: <#{}>", channel_id)).await?;

        history.reverse();
        for message in history.iter().filter(|m| !m.content.is_empty()) {
            match data.moderator.moderate(&message.content, &message.author.name).await {
                ModerationOutcome::Failed(reason) => {
                    ctx.say(format!("Error moderating message: {}", reason)).await?;
                }
                outcome => {
                    if outcome.is_flagged() {
                        flagged += 1;
                    }
                    processed.push(message.content.clone());
                }
            }
        }
    }

    data.audit.record(AuditEvent::HistoryScanned {
        by,
        messages: processed.len(),
        flagged,
    });
    info!(messages = processed.len(), flagged, "History scan finished");

    ctx.say(format!(
        "Processed {} messages for moderation ({} flagged).",
        processed.len(),
        flagged
    ))
    .await?;

    if processed.is_empty() {
        ctx.say("No messages were processed for moderation.").await?;
    } else {
        let embed = bot_embed("Scanned Message Texts", serenity::Colour::DARK_GREEN)
            .description(scan_preview(&processed));
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
    }

    ctx.say("Finished scanning message history.").await?;
    Ok(())
}
