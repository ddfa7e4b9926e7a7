// remind, reminders, cancel_reminder

use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::error;

use super::bot_embed;
use crate::bot::{Context, Error};
use crate::logging::AuditEvent;
use crate::reminders::{format_remaining, ReminderDelay};

/// Embeds hold at most 25 fields
const MAX_LISTED: usize = 25;

/// Set a timed reminder
///
/// Time is a number followed by s, m, h or d:
/// `!remind 1h Check the oven`, `!remind 30m Call mom`, `!remind 2d Submit report`
#[poise::command(prefix_command, category = "Reminders")]
pub async fn remind(ctx: Context<'_>, duration: String, #[rest] text: String) -> Result<(), Error> {
    let max_days = ctx.data().config.read().await.reminders.max_duration_days;
    let delay = match ReminderDelay::parse(&duration, max_days) {
        Ok(delay) => delay,
        Err(e) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    let added = ctx
        .data()
        .reminders
        .add(
            ctx.author().id.get(),
            ctx.channel_id().get(),
            &text,
            delay,
            Utc::now(),
        )
        .await;

    match added {
        Ok(_) => {
            ctx.say(format!("I'll remind you about **{}** in **{}**.", text, delay))
                .await?;
        }
        Err(e) => {
            error!(error = %e, "Failed to save reminder");
            ctx.say("Sorry, I couldn't save that reminder.").await?;
        }
    }
    Ok(())
}

/// List your active reminders
#[poise::command(prefix_command, category = "Reminders")]
pub async fn reminders(ctx: Context<'_>) -> Result<(), Error> {
    let mine = ctx.data().reminders.for_user(ctx.author().id.get()).await;
    if mine.is_empty() {
        ctx.say("You don't have any active reminders.").await?;
        return Ok(());
    }

    let now = Utc::now();
    let mut embed = bot_embed("Your Reminders", serenity::Colour::BLUE)
        .description(format!("You have {} active reminder(s).", mine.len()));
    for reminder in mine.iter().take(MAX_LISTED) {
        embed = embed.field(
            format!("ID: {} - {}", reminder.id, format_remaining(reminder.end_time - now)),
            reminder.message.clone(),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Cancel one of your reminders by ID (see !reminders)
#[poise::command(prefix_command, category = "Reminders")]
pub async fn cancel_reminder(ctx: Context<'_>, id: u64) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    match ctx.data().reminders.cancel(id, user_id).await {
        Ok(Some(reminder)) => {
            ctx.data()
                .audit
                .record(AuditEvent::ReminderCanceled { id, user_id });
            ctx.say(format!("Canceled reminder: {}", reminder.message))
                .await?;
        }
        Ok(None) => {
            ctx.say(format!("Could not find reminder with ID {}.", id))
                .await?;
        }
        Err(e) => {
            error!(id, error = %e, "Failed to cancel reminder");
            ctx.say("Sorry, I couldn't cancel that reminder.").await?;
        }
    }
    Ok(())
}
