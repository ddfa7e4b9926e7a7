// Member notes, names and aliases

use poise::serenity_prelude as serenity;
use tracing::error;

use super::bot_embed;
use crate::bot::format::{bullet_list, numbered_list, truncate_chars, EMBED_FIELD_LIMIT};
use crate::bot::{is_sudo, Context, Error};
use crate::logging::AuditEvent;

/// Add a note for a user
#[poise::command(prefix_command, category = "Members")]
pub async fn note(ctx: Context<'_>, username: String, #[rest] note: String) -> Result<(), Error> {
    match ctx.data().members.add_note(&username, &note).await {
        Ok(canonical) => ctx.say(format!("Note added for {}", canonical)).await?,
        Err(e) => {
            error!(username, error = %e, "Failed to add note");
            ctx.say("Failed to add note").await?
        }
    };
    Ok(())
}

/// Add a display name for a user
#[poise::command(prefix_command, category = "Members")]
pub async fn name(ctx: Context<'_>, username: String, #[rest] name: String) -> Result<(), Error> {
    let reply = match ctx.data().members.add_name(&username, &name).await {
        Ok(true) => format!("Name '{}' added for {}", name, username),
        Ok(false) => format!("Name '{}' already exists for {}", name, username),
        Err(e) => {
            error!(username, error = %e, "Failed to add name");
            "Failed to add name".to_string()
        }
    };
    ctx.say(reply).await?;
    Ok(())
}

/// Link another username to a user's record
#[poise::command(prefix_command, category = "Members")]
pub async fn alias(ctx: Context<'_>, username: String, alias: String) -> Result<(), Error> {
    let reply = match ctx.data().members.add_alias(&username, &alias).await {
        Ok(Ok(true)) => format!("'{}' is now an alias of {}", alias, username),
        Ok(Ok(false)) => format!("'{}' is already an alias of {}", alias, username),
        Ok(Err(rejected)) => rejected.to_string(),
        Err(e) => {
            error!(username, alias, error = %e, "Failed to add alias");
            "Failed to add alias".to_string()
        }
    };
    ctx.say(reply).await?;
    Ok(())
}

/// All notes for a user, numbered for !removenote (sudo)
#[poise::command(prefix_command, check = "is_sudo", category = "Members")]
pub async fn getnotes(ctx: Context<'_>, username: String) -> Result<(), Error> {
    let record = ctx.data().members.get(&username).await;
    if record.notes.is_empty() {
        ctx.say(format!("No notes found for {}", username)).await?;
    } else {
        let text = format!("Notes for {}:\n{}", username, numbered_list(&record.notes));
        ctx.say(truncate_chars(&text, 2000, "\n...")).await?;
    }
    Ok(())
}

/// Remove a note by its number from !getnotes (sudo)
#[poise::command(prefix_command, check = "is_sudo", category = "Members")]
pub async fn removenote(ctx: Context<'_>, username: String, index: String) -> Result<(), Error> {
    let invalid = "Failed to remove note. Make sure the index is valid.";
    let Ok(index) = index.trim().parse::<usize>() else {
        ctx.say(invalid).await?;
        return Ok(());
    };

    match ctx.data().members.remove_note(&username, index).await {
        Ok(Some(removed)) => {
            ctx.data().audit.record(AuditEvent::NoteRemoved {
                username: username.clone(),
                note: removed.clone(),
                by: ctx.author().id.get(),
            });
            ctx.say(format!("Removed note: {}", removed)).await?;
        }
        Ok(None) => {
            ctx.say(invalid).await?;
        }
        Err(e) => {
            error!(username, index, error = %e, "Failed to remove note");
            ctx.say("Failed to remove note").await?;
        }
    }
    Ok(())
}

/// All display names recorded for a user
#[poise::command(prefix_command, category = "Members")]
pub async fn getnames(ctx: Context<'_>, username: String) -> Result<(), Error> {
    let record = ctx.data().members.get(&username).await;
    if record.names.is_empty() {
        ctx.say(format!("No names found for {}", username)).await?;
    } else {
        let text = format!("Names for {}:\n{}", username, bullet_list(&record.names));
        ctx.say(truncate_chars(&text, 2000, "\n...")).await?;
    }
    Ok(())
}

/// Delete everything recorded about a user (sudo)
#[poise::command(prefix_command, check = "is_sudo", category = "Members")]
pub async fn deleteuser(ctx: Context<'_>, username: String) -> Result<(), Error> {
    let (canonical, record) = match ctx.data().members.delete_user(&username).await {
        Ok(Some(deleted)) => deleted,
        Ok(None) => {
            ctx.say(format!("No data found for {}", username)).await?;
            return Ok(());
        }
        Err(e) => {
            error!(username, error = %e, "Failed to delete user");
            ctx.say("Failed to delete user data").await?;
            return Ok(());
        }
    };

    ctx.data().audit.record(AuditEvent::MemberDeleted {
        username: canonical.clone(),
        by: ctx.author().id.get(),
    });

    let or_none = |items: &[String], list: fn(&[String]) -> String| {
        if items.is_empty() {
            "None".to_string()
        } else {
            truncate_chars(&list(items), EMBED_FIELD_LIMIT, "\n...")
        }
    };
    let embed = bot_embed(format!("Deleted data for {}", canonical), serenity::Colour::ORANGE)
        .field("Notes", or_none(&record.notes, numbered_list), false)
        .field("Names", or_none(&record.names, bullet_list), false)
        .field("Aliases", or_none(&record.aliases, bullet_list), false);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
