// Reminders
//
// Persisted timed reminders and the sweep that fires them.

pub mod delay;
pub mod queue;
pub mod scheduler;

pub use delay::{format_remaining, ReminderDelay, ReminderError};
pub use queue::{Reminder, ReminderQueue};
pub use scheduler::{ReminderScheduler, ReminderSink};
