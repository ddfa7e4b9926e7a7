// AI commands: prompt, roast, summarize, analyze

use chrono::{Duration, Timelike, Utc};
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use super::{bot_embed, fetch_history, timestamp_utc};
use crate::analysis::{
    analysis_prompt, clamp_limit, roast_prompt, summary_prompt, MessageStats, SampledMessage,
    DEFAULT_ANALYZE_DAYS, DEFAULT_ANALYZE_LIMIT, DEFAULT_SUMMARY_LIMIT, MAX_ANALYZE_DAYS,
    MAX_ANALYZE_LIMIT, MAX_SUMMARY_LIMIT,
};
use crate::bot::format::truncate_chars;
use crate::bot::{Context, Error};
use crate::openai::{OpenAiError, DEFAULT_INSTRUCTIONS};

/// Discord's message length limit
const MESSAGE_LIMIT: usize = 2000;

/// Ask the model and reply with its answer
#[poise::command(prefix_command, category = "AI")]
pub async fn prompt(ctx: Context<'_>, #[rest] text: String) -> Result<(), Error> {
    ctx.defer_or_broadcast().await?;

    let reply = match ctx.data().completions.complete(DEFAULT_INSTRUCTIONS, &text).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "Prompt failed");
            e.user_message().to_string()
        }
    };
    ctx.say(truncate_chars(&reply, MESSAGE_LIMIT, "...")).await?;
    Ok(())
}

/// A light-hearted roast of someone (or you)
#[poise::command(prefix_command, category = "AI")]
pub async fn roast(ctx: Context<'_>, user: Option<serenity::User>) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    ctx.defer_or_broadcast().await?;

    let reply = match ctx
        .data()
        .completions
        .complete(DEFAULT_INSTRUCTIONS, &roast_prompt(&target.name))
        .await
    {
        Ok(roast) => format!("<@{}> {}", target.id, roast),
        Err(e) => {
            warn!(error = %e, "Roast failed");
            e.user_message().to_string()
        }
    };
    ctx.say(truncate_chars(&reply, MESSAGE_LIMIT, "...")).await?;
    Ok(())
}

/// Summarize the recent conversation in this channel
///
/// `!summarize` covers the last 25 messages, `!summarize 50` the last 50 (at most 100).
#[poise::command(prefix_command, category = "AI Analysis")]
pub async fn summarize(ctx: Context<'_>, limit: Option<usize>) -> Result<(), Error> {
    let (limit, clamped) = clamp_limit(limit.unwrap_or(DEFAULT_SUMMARY_LIMIT), MAX_SUMMARY_LIMIT);
    if clamped {
        ctx.say(format!("Maximum summary length is {} messages.", MAX_SUMMARY_LIMIT))
            .await?;
    }
    ctx.defer_or_broadcast().await?;

    let history = fetch_history(ctx.http(), ctx.channel_id(), limit, |_| true).await?;
    let mut lines: Vec<String> = history
        .iter()
        .filter(|m| !m.author.bot && !m.content.is_empty())
        .map(|m| format!("{}: {}", m.author.name, m.content))
        .collect();
    if lines.is_empty() {
        ctx.say("No messages to summarize.").await?;
        return Ok(());
    }
    // Fetched newest first
    lines.reverse();

    match ctx
        .data()
        .completions
        .complete(DEFAULT_INSTRUCTIONS, &summary_prompt(&lines))
        .await
    {
        Ok(summary) => {
            let embed = bot_embed(format!("Channel Summary ({} messages)", lines.len()), serenity::Colour::BLUE)
                .description(truncate_chars(&summary, 4096, "..."))
                .footer(serenity::CreateEmbedFooter::new(format!("Requested by {}", ctx.author().name)));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            info!(messages = lines.len(), channel_id = %ctx.channel_id(), "Summary generated");
        }
        Err(e) => {
            warn!(error = %e, "Summary failed");
            ctx.say(failure_message(&e, "summary")).await?;
        }
    }
    Ok(())
}

/// Analyze someone's messages in this channel
///
/// `!analyze` looks at your own messages from the past week, `!analyze @User 14`
/// at another member's over 14 days (at most 30 days and 2000 messages).
#[poise::command(prefix_command, category = "AI Analysis")]
pub async fn analyze(
    ctx: Context<'_>,
    user: Option<serenity::User>,
    days: Option<u32>,
    limit: Option<usize>,
) -> Result<(), Error> {
    let target = user.unwrap_or_else(|| ctx.author().clone());

    let (days, days_clamped) = clamp_limit(days.unwrap_or(DEFAULT_ANALYZE_DAYS), MAX_ANALYZE_DAYS);
    if days_clamped {
        ctx.say(format!("Maximum analysis period is {} days.", MAX_ANALYZE_DAYS))
            .await?;
    }
    let (limit, limit_clamped) = clamp_limit(limit.unwrap_or(DEFAULT_ANALYZE_LIMIT), MAX_ANALYZE_LIMIT);
    if limit_clamped {
        ctx.say(format!("Maximum message count is {}.", MAX_ANALYZE_LIMIT))
            .await?;
    }

    let progress = ctx
        .say(format!(
            "Analyzing {}'s messages from the past {} days... This may take a moment.",
            target.name, days
        ))
        .await?;

    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let history = fetch_history(ctx.http(), ctx.channel_id(), limit, |m| {
        timestamp_utc(m.timestamp) >= cutoff
    })
    .await?;

    // Chronological, so the sample below is the most recent messages
    let mut sampled: Vec<SampledMessage> = history
        .iter()
        .filter(|m| m.author.id == target.id && !m.content.is_empty())
        .map(|m| SampledMessage {
            content: m.content.clone(),
            hour: timestamp_utc(m.timestamp).hour(),
        })
        .collect();
    sampled.reverse();

    let stats = MessageStats::compute(&sampled);
    progress
        .edit(
            ctx,
            poise::CreateReply::default().content(format!(
                "Found {} messages from {}. Generating analysis...",
                stats.message_count, target.name
            )),
        )
        .await?;

    if stats.message_count == 0 {
        ctx.say(format!(
            "No messages found from {} in the past {} days.",
            target.name, days
        ))
        .await?;
        return Ok(());
    }

    let contents: Vec<String> = sampled.into_iter().map(|m| m.content).collect();
    match ctx
        .data()
        .completions
        .complete(DEFAULT_INSTRUCTIONS, &analysis_prompt(&target.name, &contents))
        .await
    {
        Ok(analysis) => {
            let embed = bot_embed(format!("Analysis for {}", target.name), serenity::Colour::BLUE)
                .description(truncate_chars(&analysis, 4096, "..."))
                .thumbnail(target.face())
                .field("Activity Statistics", stats.activity_field(), true)
                .field("Word Usage", stats.word_usage_field(), true)
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Analysis based on {} messages from the past {} days",
                    stats.message_count, days
                )));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            info!(user = %target.name, messages = stats.message_count, "Analysis generated");
        }
        Err(e) => {
            warn!(error = %e, "Analysis failed");
            ctx.say(failure_message(&e, "analysis")).await?;
        }
    }
    Ok(())
}

fn failure_message(error: &OpenAiError, what: &str) -> String {
    match error {
        OpenAiError::MissingApiKey => error.user_message().to_string(),
        _ => format!("Sorry, I encountered an error while generating the {}.", what),
    }
}
