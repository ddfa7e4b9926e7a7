// Logging
//
// Process logging goes through `tracing`; `init_tracing` installs the
// subscriber. The audit log is the durable record of moderation and
// administrative actions.

pub mod audit_log;

pub use audit_log::{AuditEvent, AuditLogger};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` for this crate when `verbose`
/// and `info` everywhere else.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "info,hedgebot=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
