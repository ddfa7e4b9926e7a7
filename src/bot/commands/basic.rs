// ping, info, help

use poise::serenity_prelude as serenity;

use super::bot_embed;
use crate::bot::{Context, Error};

/// A simple ping command
#[poise::command(prefix_command, category = "Basic")]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Pong! 🏓").await?;
    Ok(())
}

/// Bot information
#[poise::command(prefix_command, category = "Basic")]
pub async fn info(ctx: Context<'_>) -> Result<(), Error> {
    let channel = match ctx.guild_id() {
        Some(_) => format!("<#{}>", ctx.channel_id()),
        None => "Direct Message".to_string(),
    };

    let embed = bot_embed("Bot Information", serenity::Colour::BLUE)
        .description(
            "I'm Hedge's bot. Still working on more features.",
        )
        .field("Author", ctx.author().name.clone(), false)
        .field("Channel", channel, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show all commands, or details for one
#[poise::command(prefix_command, track_edits, category = "Basic")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help for"] command: Option<String>,
) -> Result<(), Error> {
    let config = poise::builtins::HelpConfiguration {
        extra_text_at_bottom: "Type !help [command] for more information on a command. <required> [optional]",
        ..Default::default()
    };
    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}
