// Moderation pipeline
//
// Classify a message and record every flagged category

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::archive::OffenseArchive;
use super::ledger::OffenseLedger;
use crate::logging::{AuditEvent, AuditLogger};
use crate::openai::ModerationProvider;

/// What happened to a moderated message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Nothing to classify (empty or whitespace-only content)
    Skipped,
    Clean,
    /// Categories the classifier flagged, all recorded
    Flagged(Vec<String>),
    /// Classifier call failed; nothing recorded
    Failed(String),
}

impl ModerationOutcome {
    pub fn is_flagged(&self) -> bool {
        matches!(self, ModerationOutcome::Flagged(_))
    }
}

pub struct Moderator {
    classifier: Arc<dyn ModerationProvider>,
    ledger: Arc<OffenseLedger>,
    archive: Arc<OffenseArchive>,
    audit: Option<Arc<AuditLogger>>,
}

impl Moderator {
    pub fn new(
        classifier: Arc<dyn ModerationProvider>,
        ledger: Arc<OffenseLedger>,
        archive: Arc<OffenseArchive>,
    ) -> Self {
        Self {
            classifier,
            ledger,
            archive,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn ledger(&self) -> &Arc<OffenseLedger> {
        &self.ledger
    }

    pub fn archive(&self) -> &Arc<OffenseArchive> {
        &self.archive
    }

    /// Run `content` written by `username` through the classifier.
    ///
    /// Never returns an error: classifier failures come back as
    /// `ModerationOutcome::Failed`, and a store failure for one category is
    /// logged without stopping the others.
    pub async fn moderate(&self, content: &str, username: &str) -> ModerationOutcome {
        if content.trim().is_empty() {
            return ModerationOutcome::Skipped;
        }

        let verdict = match self.classifier.classify(content).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(username, error = %e, "Moderation request failed");
                return ModerationOutcome::Failed(e.to_string());
            }
        };

        if verdict.categories.is_empty() {
            if verdict.flagged {
                warn!(username, "Classifier flagged message without naming a category");
            }
            debug!(username, "Message clean");
            return ModerationOutcome::Clean;
        }

        let now = Utc::now();
        for category in &verdict.categories {
            match self.ledger.record(username, category).await {
                Ok(count) => {
                    if let Some(audit) = &self.audit {
                        audit.record(AuditEvent::OffenseRecorded {
                            username: username.to_string(),
                            category: category.clone(),
                            count,
                        });
                    }
                }
                Err(e) => error!(username, category = %category, error = %e, "Failed to record offense"),
            }

            if let Err(e) = self.archive.record(username, category, content, now).await {
                error!(username, category = %category, error = %e, "Failed to archive offense message");
            }
        }

        info!(username, categories = ?verdict.categories, "Message flagged");
        ModerationOutcome::Flagged(verdict.categories)
    }
}
