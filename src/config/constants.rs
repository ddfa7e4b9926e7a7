// Project-wide constants
//
// Centralised here so file names and limits have one source of truth.
// Import via `use crate::config::constants::*;`.

/// Default command prefix (matches the prefix users already know from the old bot).
pub const DEFAULT_PREFIX: &str = "!";

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default model for `prompt`, `roast`, `summarize` and `analyze`.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Default model for the moderation endpoint.
pub const DEFAULT_MODERATION_MODEL: &str = "omni-moderation-latest";

/// Reminder sweep interval.
pub const DEFAULT_REMINDER_POLL_SECS: u64 = 30;

/// Longest reminder a user may set.
pub const DEFAULT_REMINDER_MAX_DAYS: u64 = 30;

/// Upper bound for `max_duration_days`. Due times must stay inside chrono's range.
pub const MAX_REMINDER_DAYS_LIMIT: u64 = 3650;

/// File names inside `data_dir`.
pub const OFFENSES_FILE: &str = "moderation.json";
pub const OFFENSE_MESSAGES_FILE: &str = "offense_messages.json";
pub const MEMBERS_FILE: &str = "members.json";
pub const REMINDERS_FILE: &str = "reminders.json";
pub const ROLE_MENUS_FILE: &str = "role_menus.json";
pub const AUDIT_DIR: &str = "audit";

/// Per-user cap on archived offense messages.
pub const MAX_ARCHIVED_OFFENSES: usize = 20;

/// Archived message content is cut to this many characters (marker included).
pub const MAX_ARCHIVED_CONTENT_CHARS: usize = 500;

/// Footer shown on bot embeds.
pub const EMBED_FOOTER: &str = "HedgeDiscordBot";
