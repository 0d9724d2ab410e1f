//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system, honouring `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default filter used when `RUST_LOG` is unset
pub fn init_with_default_filter(filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

/// Route log output through the test harness; safe to call from every test
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
