// Prefix commands

pub mod ai;
pub mod basic;
pub mod members;
pub mod moderation;
pub mod reminders;
pub mod rolemenu;
pub mod utility;

use anyhow::Result;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;

use super::{Data, Error};
use crate::config::constants::EMBED_FOOTER;

/// Every command the bot registers
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        basic::ping(),
        basic::info(),
        basic::help(),
        ai::prompt(),
        ai::roast(),
        ai::summarize(),
        ai::analyze(),
        moderation::offenses(),
        moderation::offenses_user(),
        moderation::add_channel(),
        moderation::remove_channel(),
        moderation::scan_history(),
        members::note(),
        members::name(),
        members::alias(),
        members::getnotes(),
        members::removenote(),
        members::getnames(),
        members::deleteuser(),
        reminders::remind(),
        reminders::reminders(),
        reminders::cancel_reminder(),
        utility::serverinfo(),
        utility::userinfo(),
        utility::invite(),
        rolemenu::rolemenu(),
    ]
}

/// Embed with the bot's footer
pub(crate) fn bot_embed(title: impl Into<String>, colour: serenity::Colour) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .colour(colour)
        .footer(serenity::CreateEmbedFooter::new(EMBED_FOOTER))
}

pub(crate) fn timestamp_utc(ts: serenity::Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_default()
}

/// Up to `limit` messages from `channel_id`, newest first. Paging stops early
/// once `keep_going` returns false for a message.
pub(crate) async fn fetch_history(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    limit: usize,
    mut keep_going: impl FnMut(&serenity::Message) -> bool,
) -> Result<Vec<serenity::Message>> {
    let mut collected: Vec<serenity::Message> = Vec::new();
    let mut before: Option<serenity::MessageId> = None;

    while collected.len() < limit {
        let page_size = (limit - collected.len()).min(100) as u8;
        let mut request = serenity::GetMessages::new().limit(page_size);
        if let Some(id) = before {
            request = request.before(id);
        }

        let page = channel_id.messages(http, request).await?;
        let exhausted = page.len() < page_size as usize;
        before = page.last().map(|m| m.id);

        for message in page {
            if !keep_going(&message) {
                return Ok(collected);
            }
            collected.push(message);
        }

        if exhausted || before.is_none() {
            break;
        }
    }

    Ok(collected)
}
