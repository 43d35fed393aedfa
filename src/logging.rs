//! Logger bootstrap shared by the binary and tests.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger.
///
/// When `verbose` is `true`, debug messages are printed as well; otherwise
/// only info level and above are shown. `RUST_LOG` overrides either choice.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(default_level.to_string());

    // `try_init` only fails when a logger is already installed; ignore that
    // so tests can call `init` repeatedly.
    let _ = Builder::from_env(env).try_init();
}
