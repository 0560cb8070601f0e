//! Process-wide tracing subscriber setup. Replaces scattered
//! `println!` calls with structured, level-filtered spans.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Safe to call once per process;
/// a second call is a no-op (the underlying `try_init` just errors
/// silently if a subscriber is already set).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
