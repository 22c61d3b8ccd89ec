//! Log output setup.
//!
//! Code throughout the crate logs through the `log` macros.  [`init`]
//! installs a `tracing-subscriber` formatter as the backend and bridges
//! `log` records into it.  `RUST_LOG` overrides the default INFO level,
//! e.g. `RUST_LOG=offgrid=debug` to see every conversion.

use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
};

/// Install the stdout subscriber.  Calling it twice is harmless.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();

    if installed.is_err() {
        log::debug!("logging already initialised");
    }
}
