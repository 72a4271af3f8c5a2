//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Map `logging.methods` onto an `EnvFilter` once the config is known
//!
//! # Design Decisions
//! - `RUST_LOG`, when set, wins over the configuration
//! - Custom log channels are tracing targets of the same name

use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::schema::LogMethods;

/// Filter used before the configuration is loaded.
const BOOT_FILTER: &str = "roosevelt=info,tower_http=info";

/// Handle for retuning the log filter after startup.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Apply the configured log channels, unless `RUST_LOG` is set.
    pub fn apply(&self, methods: &LogMethods) {
        if self.from_env {
            return;
        }
        let directives = filter_directives(methods);
        match EnvFilter::try_new(&directives) {
            Ok(filter) => {
                if let Err(err) = self.filter.reload(filter) {
                    tracing::warn!(error = %err, "Failed to apply log settings");
                }
            }
            Err(err) => tracing::warn!(error = %err, directives = %directives, "Invalid log settings"),
        }
    }
}

/// Install the global subscriber.
pub fn init_logging() -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(BOOT_FILTER), false),
    };
    let (filter_layer, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
    LogHandle {
        filter: handle,
        from_env,
    }
}

/// `EnvFilter` directives for the configured channels.
pub fn filter_directives(methods: &LogMethods) -> String {
    let level = if methods.verbose {
        "debug"
    } else if methods.info {
        "info"
    } else if methods.warn {
        "warn"
    } else if methods.error {
        "error"
    } else {
        "off"
    };
    let http = if methods.http { "info" } else { "off" };

    let mut directives = vec![format!("roosevelt={level}"), format!("tower_http={http}")];
    for (channel, enabled) in &methods.custom {
        directives.push(format!("{channel}={}", if *enabled { "info" } else { "off" }));
    }
    directives.join(",")
}
