// Gateway events
//
// Ready starts the reminder sweep, messages in monitored channels are
// moderated, and reactions on role menu messages toggle roles.

use anyhow::Result;
use poise::serenity_prelude as serenity;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

use super::{Data, Error};
use crate::moderation::ModerationOutcome;

pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                user = %data_about_bot.user.name,
                id = %data_about_bot.user.id,
                guilds = data_about_bot.guilds.len(),
                "Connected to Discord"
            );
            // Ready fires again after a reconnect
            if !data.scheduler_started.swap(true, Ordering::SeqCst) {
                let scheduler = data.scheduler.clone();
                tokio::spawn(async move { scheduler.run().await });
            }
        }
        serenity::FullEvent::Message { new_message } => {
            on_message(ctx, new_message, data).await?;
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            on_reaction(ctx, add_reaction, data, true).await?;
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            on_reaction(ctx, removed_reaction, data, false).await?;
        }
        serenity::FullEvent::MessageDelete {
            deleted_message_id, ..
        } => {
            if let Some(menu) = data.role_menus.remove(deleted_message_id.get()).await? {
                info!(message_id = %deleted_message_id, title = %menu.title, "Role menu message deleted, menu dropped");
            }
        }
        _ => {}
    }
    Ok(())
}

async fn on_message(ctx: &serenity::Context, msg: &serenity::Message, data: &Data) -> Result<()> {
    if msg.author.bot || msg.guild_id.is_none() {
        return Ok(());
    }

    let (monitored, excluded, greet) = {
        let config = data.config.read().await;
        (
            config.is_monitored(msg.channel_id.get()),
            config.is_excluded(msg.author.id.get()),
            config.features.greet_on_hello,
        )
    };
    if !monitored {
        return Ok(());
    }
    debug!(channel_id = %msg.channel_id, author = %msg.author.name, "Message in monitored channel");

    if !excluded {
        if let ModerationOutcome::Failed(reason) = data.moderator.moderate(&msg.content, &msg.author.name).await {
            debug!(message_id = %msg.id, reason, "Message left unmoderated");
        }
    }

    if greet && msg.content.to_lowercase().contains("hello bot") {
        msg.channel_id
            .say(&ctx.http, format!("Hello, <@{}>!", msg.author.id))
            .await?;
    }
    Ok(())
}

async fn on_reaction(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    data: &Data,
    added: bool,
) -> Result<()> {
    let (Some(guild_id), Some(user_id)) = (reaction.guild_id, reaction.user_id) else {
        return Ok(());
    };
    if user_id == ctx.cache.current_user().id {
        return Ok(());
    }

    let emoji = match &reaction.emoji {
        serenity::ReactionType::Unicode(text) => text.clone(),
        serenity::ReactionType::Custom { id, .. } => id.get().to_string(),
        _ => return Ok(()),
    };

    let Some(role_id) = data.role_menus.role_for(reaction.message_id.get(), &emoji).await else {
        return Ok(());
    };
    let role_id = serenity::RoleId::new(role_id);

    let result = if added {
        ctx.http
            .add_member_role(guild_id, user_id, role_id, Some("Role menu"))
            .await
    } else {
        ctx.http
            .remove_member_role(guild_id, user_id, role_id, Some("Role menu"))
            .await
    };

    match result {
        Ok(()) => info!(%user_id, %role_id, added, "Role menu toggled role"),
        Err(e) => warn!(%user_id, %role_id, added, error = %e, "Failed to toggle role from menu"),
    }
    Ok(())
}
