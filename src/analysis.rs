// Conversation analysis
//
// Message statistics and prompts for summarize/analyze/roast

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub const DEFAULT_SUMMARY_LIMIT: usize = 25;
pub const MAX_SUMMARY_LIMIT: usize = 100;
pub const DEFAULT_ANALYZE_DAYS: u32 = 7;
pub const MAX_ANALYZE_DAYS: u32 = 30;
pub const DEFAULT_ANALYZE_LIMIT: usize = 1000;
pub const MAX_ANALYZE_LIMIT: usize = 2000;
/// Messages passed to the model for the style analysis
pub const ANALYSIS_SAMPLE_SIZE: usize = 50;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-zA-Z]+\b").expect("valid word regex"));

/// A message reduced to what the statistics need
#[derive(Debug, Clone)]
pub struct SampledMessage {
    pub content: String,
    /// UTC hour the message was sent, 0-23
    pub hour: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageStats {
    pub message_count: usize,
    pub average_length: f64,
    pub words_per_message: f64,
    pub most_active_hour: Option<u32>,
    pub total_words: usize,
    pub unique_words: usize,
    /// Most frequent words longer than two letters, most frequent first
    pub top_words: Vec<String>,
}

impl MessageStats {
    /// Compute statistics over `messages`; empty contents are ignored
    pub fn compute(messages: &[SampledMessage]) -> Self {
        let mut hours: HashMap<u32, usize> = HashMap::new();
        let mut words: HashMap<String, usize> = HashMap::new();
        let mut message_count = 0;
        let mut total_chars = 0;
        let mut total_words = 0;

        for message in messages.iter().filter(|m| !m.content.is_empty()) {
            message_count += 1;
            total_chars += message.content.chars().count();
            *hours.entry(message.hour).or_default() += 1;

            let lowered = message.content.to_lowercase();
            for word in WORD.find_iter(&lowered).map(|m| m.as_str()) {
                total_words += 1;
                if word.len() > 2 {
                    *words.entry(word.to_string()).or_default() += 1;
                }
            }
        }

        // Ties go to the earlier hour
        let most_active_hour = hours
            .iter()
            .max_by(|(ha, ca), (hb, cb)| ca.cmp(cb).then(hb.cmp(ha)))
            .map(|(hour, _)| *hour);

        let mut ranked: Vec<(&String, &usize)> = words.iter().collect();
        ranked.sort_by(|(wa, ca), (wb, cb)| cb.cmp(ca).then(wa.cmp(wb)));
        let top_words = ranked.into_iter().take(10).map(|(w, _)| w.clone()).collect();

        let per_message = |total: usize| {
            if message_count == 0 {
                0.0
            } else {
                total as f64 / message_count as f64
            }
        };

        Self {
            message_count,
            average_length: per_message(total_chars),
            words_per_message: per_message(total_words),
            most_active_hour,
            total_words,
            unique_words: words.len(),
            top_words,
        }
    }

    pub fn activity_field(&self) -> String {
        let hour = self
            .most_active_hour
            .map(|h| format!("{}:00", h))
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "**Messages:** {}\n**Average length:** {:.1} characters\n**Words per message:** {:.1}\n**Most active hour:** {}",
            self.message_count, self.average_length, self.words_per_message, hour
        )
    }

    pub fn word_usage_field(&self) -> String {
        let common: Vec<&str> = self.top_words.iter().take(5).map(String::as_str).collect();
        format!(
            "**Total words:** {}\n**Unique words:** {}\n**Common words:** {}",
            self.total_words,
            self.unique_words,
            common.join(", ")
        )
    }
}

/// Clamp a requested value to `max`, reporting whether it was reduced
pub fn clamp_limit<T: PartialOrd + Copy>(requested: T, max: T) -> (T, bool) {
    if requested > max {
        (max, true)
    } else {
        (requested, false)
    }
}

/// `lines` must be "author: content" in chronological order
pub fn summary_prompt(lines: &[String]) -> String {
    format!(
        "Please provide a brief but comprehensive summary of the following conversation. \
         Focus on the main topics discussed, key points made, and any conclusions reached. \
         Keep the summary concise (3-5 sentences).\n\n\
         CONVERSATION (most recent {} messages):\n\n{}",
        lines.len(),
        lines.join("\n")
    )
}

/// Style analysis over the last `ANALYSIS_SAMPLE_SIZE` of `messages`
pub fn analysis_prompt(username: &str, messages: &[String]) -> String {
    let start = messages.len().saturating_sub(ANALYSIS_SAMPLE_SIZE);
    format!(
        "Analyze the following message sample from a Discord user named {}. \
         Provide a short analysis of their communication style, apparent personality traits based on their writing, \
         and the sentiment/tone of their messages. \
         Keep the analysis professional, respectful, and around 3-4 sentences long.\n\n\
         MESSAGE SAMPLE:\n\n{}",
        username,
        messages[start..].join("\n")
    )
}

pub fn roast_prompt(name: &str) -> String {
    format!(
        "Write a short, light-hearted roast of a Discord user named {}. \
         Keep it playful and friendly: no insults about appearance, identity, or anything hurtful. \
         Two or three sentences.",
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str, hour: u32) -> SampledMessage {
        SampledMessage {
            content: content.to_string(),
            hour,
        }
    }

    #[test]
    fn test_stats_basic() {
        let stats = MessageStats::compute(&[
            msg("Rust is great", 10),
            msg("rust rust RUST", 10),
            msg("ok go", 22),
            msg("", 3),
        ]);

        assert_eq!(stats.message_count, 3);
        assert_eq!(stats.total_words, 8);
        assert!((stats.words_per_message - 8.0 / 3.0).abs() < 1e-9);
        assert!((stats.average_length - 32.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.most_active_hour, Some(10));
        // "is", "ok", "go" are too short to count
        assert_eq!(stats.unique_words, 2);
        assert_eq!(stats.top_words, vec!["rust", "great"]);
    }

    #[test]
    fn test_stats_empty() {
        let stats = MessageStats::compute(&[]);
        assert_eq!(stats.message_count, 0);
        assert_eq!(stats.words_per_message, 0.0);
        assert_eq!(stats.most_active_hour, None);
        assert!(stats.activity_field().contains("N/A"));
    }

    #[test]
    fn test_most_active_hour_tie_goes_to_earlier() {
        let stats = MessageStats::compute(&[msg("a", 18), msg("b", 4)]);
        assert_eq!(stats.most_active_hour, Some(4));
    }

    #[test]
    fn test_word_usage_field_lists_five() {
        let text = "alpha beta gamma delta epsilon zeta";
        let stats = MessageStats::compute(&[msg(text, 1)]);
        let field = stats.word_usage_field();
        assert!(field.contains("**Unique words:** 6"));
        assert_eq!(field.lines().last().unwrap().matches(", ").count(), 4);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(150usize, MAX_SUMMARY_LIMIT), (100, true));
        assert_eq!(clamp_limit(25usize, MAX_SUMMARY_LIMIT), (25, false));
        assert_eq!(clamp_limit(31u32, MAX_ANALYZE_DAYS), (30, true));
    }

    #[test]
    fn test_analysis_prompt_samples_last_fifty() {
        let messages: Vec<String> = (0..60).map(|i| format!("m{}", i)).collect();
        let prompt = analysis_prompt("alice", &messages);
        assert!(prompt.contains("named alice"));
        assert!(!prompt.contains("m9\n"));
        assert!(prompt.contains("m10\n"));
        assert!(prompt.ends_with("m59"));
    }

    #[test]
    fn test_summary_prompt_counts_lines() {
        let prompt = summary_prompt(&["a: hi".into(), "b: hello".into()]);
        assert!(prompt.contains("most recent 2 messages"));
        assert!(prompt.ends_with("a: hi\nb: hello"));
    }
}
