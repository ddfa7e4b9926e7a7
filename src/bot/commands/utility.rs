// serverinfo, userinfo, invite

use anyhow::anyhow;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use super::{bot_embed, timestamp_utc};
use crate::bot::format::{date_with_age, truncate_chars, EMBED_FIELD_LIMIT};
use crate::bot::{Context, Error};

/// Invites created by !invite expire after a day
const INVITE_MAX_AGE_SECS: u32 = 86_400;

struct GuildSummary {
    id: serenity::GuildId,
    name: String,
    icon: Option<String>,
    owner_id: serenity::UserId,
    members: u64,
    bots: usize,
    text_channels: usize,
    voice_channels: usize,
    categories: usize,
    roles: usize,
}

/// Server statistics
#[poise::command(prefix_command, guild_only, category = "Utility")]
pub async fn serverinfo(ctx: Context<'_>) -> Result<(), Error> {
    // The cache guard must not be held across an await
    let summary = {
        let guild = ctx
            .guild()
            .ok_or_else(|| anyhow!("guild is not in the cache"))?;
        let count_kind = |kind: serenity::ChannelType| {
            guild.channels.values().filter(|c| c.kind == kind).count()
        };
        GuildSummary {
            id: guild.id,
            name: guild.name.clone(),
            icon: guild.icon_url(),
            owner_id: guild.owner_id,
            members: guild.member_count,
            bots: guild.members.values().filter(|m| m.user.bot).count(),
            text_channels: count_kind(serenity::ChannelType::Text),
            voice_channels: count_kind(serenity::ChannelType::Voice),
            categories: count_kind(serenity::ChannelType::Category),
            // @everyone is not worth counting
            roles: guild.roles.len().saturating_sub(1),
        }
    };

    let created = timestamp_utc(summary.id.created_at());
    let mut embed = bot_embed(format!("{} Server Information", summary.name), serenity::Colour::BLUE)
        .description(format!("ID: {}", summary.id))
        .field("Owner", format!("<@{}>", summary.owner_id), true)
        .field("Created On", date_with_age(created, Utc::now()), true)
        .field(
            "Members",
            format!("Total: {}\nBots: {}", summary.members, summary.bots),
            true,
        )
        .field(
            "Channels",
            format!(
                "Text: {}\nVoice: {}\nCategories: {}",
                summary.text_channels, summary.voice_channels, summary.categories
            ),
            true,
        )
        .field("Roles", summary.roles.to_string(), true)
        .footer(serenity::CreateEmbedFooter::new(format!("Requested by {}", ctx.author().name)));
    if let Some(icon) = summary.icon {
        embed = embed.thumbnail(icon);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Information about a member (or you)
#[poise::command(prefix_command, guild_only, category = "Utility")]
pub async fn userinfo(ctx: Context<'_>, member: Option<serenity::Member>) -> Result<(), Error> {
    let member = match member {
        Some(member) => member,
        None => ctx
            .author_member()
            .await
            .ok_or_else(|| anyhow!("could not load the author's member data"))?
            .into_owned(),
    };

    let now = Utc::now();
    let joined = member
        .joined_at
        .map(|ts| date_with_age(timestamp_utc(ts), now))
        .unwrap_or_else(|| "Unknown".to_string());
    let created = date_with_age(timestamp_utc(member.user.id.created_at()), now);
    let roles: Vec<String> = member.roles.iter().map(|r| format!("<@&{}>", r)).collect();
    let roles_text = if roles.is_empty() {
        "No roles".to_string()
    } else {
        truncate_chars(&roles.join(", "), EMBED_FIELD_LIMIT, "...")
    };

    let mut embed = bot_embed(member.user.name.clone(), serenity::Colour::BLUE)
        .description(format!("ID: {}", member.user.id))
        .thumbnail(member.face())
        .field("Joined Server", joined, true)
        .field("Account Created", created, true);
    if let Some(since) = member.premium_since {
        embed = embed.field(
            "Boosting Since",
            timestamp_utc(since).format("%B %d, %Y").to_string(),
            true,
        );
    }
    if let Some(nick) = &member.nick {
        embed = embed.field("Nickname", nick.clone(), true);
    }
    embed = embed
        .field(format!("Roles [{}]", roles.len()), roles_text, false)
        .footer(serenity::CreateEmbedFooter::new(format!("Requested by {}", ctx.author().name)));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// DM yourself a 24 hour invite to this channel
#[poise::command(prefix_command, guild_only, category = "Utility")]
pub async fn invite(ctx: Context<'_>, max_uses: Option<u8>) -> Result<(), Error> {
    let mut builder = serenity::CreateInvite::new()
        .max_age(INVITE_MAX_AGE_SECS)
        .unique(true);
    if let Some(uses) = max_uses {
        builder = builder.max_uses(uses);
    }

    let invite = match ctx.channel_id().create_invite(ctx.http(), builder).await {
        Ok(invite) => invite,
        Err(e) => {
            warn!(channel_id = %ctx.channel_id(), error = %e, "Failed to create invite");
            ctx.say("I couldn't create an invite for this channel. Do I have permission?")
                .await?;
            return Ok(());
        }
    };

    let uses = match max_uses {
        Some(n) if n > 0 => format!("{} use(s)", n),
        _ => "unlimited uses".to_string(),
    };
    let dm = serenity::CreateMessage::new().content(format!(
        "Here is your invite (valid for 24 hours, {}): {}",
        uses,
        invite.url()
    ));

    match ctx.author().direct_message(ctx.http(), dm).await {
        Ok(_) => {
            info!(user_id = %ctx.author().id, code = %invite.code, "Invite sent");
            ctx.say("I've sent you an invite link by DM.").await?;
        }
        Err(e) => {
            warn!(user_id = %ctx.author().id, error = %e, "Failed to DM invite");
            ctx.say("I couldn't DM you. Check that direct messages from server members are allowed.")
                .await?;
        }
    }
    Ok(())
}
