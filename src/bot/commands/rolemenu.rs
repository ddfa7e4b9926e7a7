// Reaction role menus

use poise::serenity_prelude as serenity;
use tracing::{error, warn};

use super::bot_embed;
use crate::bot::{is_sudo, Context, Error};
use crate::logging::AuditEvent;
use crate::rolemenus::{parse_menu_args, RoleMenu};

/// Post a role menu: `!rolemenu "Colours" 🔴 @Red 🔵 @Blue` (sudo)
///
/// Reacting with an emoji grants its role; removing the reaction takes it away.
#[poise::command(prefix_command, check = "is_sudo", guild_only, category = "Utility")]
pub async fn rolemenu(ctx: Context<'_>, title: String, #[rest] pairs: String) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let entries = match parse_menu_args(&pairs) {
        Ok(entries) => entries,
        Err(e) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    let mut reactions = Vec::with_capacity(entries.len());
    for entry in &entries {
        match serenity::ReactionType::try_from(entry.emoji.as_str()) {
            Ok(reaction) => reactions.push(reaction),
            Err(_) => {
                ctx.say(format!("{} is not an emoji I can react with.", entry.emoji))
                    .await?;
                return Ok(());
            }
        }
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| format!("{} → <@&{}>", entry.emoji, entry.role_id))
        .collect();
    let embed = bot_embed(title.clone(), serenity::Colour::BLURPLE).description(format!(
        "React to get a role, remove your reaction to drop it.\n\n{}",
        lines.join("\n")
    ));

    let message = ctx
        .channel_id()
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;

    for reaction in reactions {
        if let Err(e) = message.react(ctx.http(), reaction).await {
            warn!(message_id = %message.id, error = %e, "Failed to add role menu reaction");
        }
    }

    let menu = RoleMenu {
        guild_id: guild_id.get(),
        channel_id: ctx.channel_id().get(),
        title,
        entries,
    };
    if let Err(e) = ctx.data().role_menus.insert(message.id.get(), menu).await {
        error!(message_id = %message.id, error = %e, "Failed to save role menu");
        ctx.say("The menu was posted but could not be saved; reactions to it won't assign roles.")
            .await?;
        return Ok(());
    }

    ctx.data().audit.record(AuditEvent::RoleMenuCreated {
        message_id: message.id.get(),
        channel_id: ctx.channel_id().get(),
        by: ctx.author().id.get(),
    });
    Ok(())
}
