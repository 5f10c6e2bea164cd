use env_logger::{Builder, Env, Target};

/// Initialize logging on stderr.
///
/// Uses the `RUST_LOG` env var if set, otherwise falls back to the provided
/// level. Stdout is reserved for Singer messages.
pub fn init(log_level: &str) {
    Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .target(Target::Stderr)
        .init();
}
