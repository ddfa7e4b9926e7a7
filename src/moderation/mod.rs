// Moderation
//
// Offense ledger (counters), offense archive (recent flagged messages) and the
// pipeline that feeds them from the classifier.

pub mod archive;
pub mod ledger;
pub mod pipeline;

pub use archive::{ArchivedOffense, OffenseArchive};
pub use ledger::{OffenseCounts, OffenseLedger};
pub use pipeline::{ModerationOutcome, Moderator};
