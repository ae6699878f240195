//! Logging setup.
//!
//! The library logs through the `log` facade. Applications embedding it call
//! [`init`] once to print those records with `env_logger`.

/// Initialize logging to stderr
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once, or after another logger was installed, does nothing.
///
/// # Example
///
/// ```no_run
/// poker_sync::logging::init();
/// log::info!("Session starting");
/// ```
pub fn init() {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();

    if result.is_ok() {
        log::debug!("Logging initialized");
    }
}
