use std::env;

use log::LevelFilter;

/// Initialize logging for the command-line driver. The library itself only emits records through
/// the `log` facade and never installs a logger.
///
/// `debug_enabled` raises the default level from `Info` to `Debug`; an explicit `RUST_LOG` always
/// wins.
pub fn init_logger(debug_enabled: bool) {
    let level = if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    // A second initialization (e.g. from tests) is harmless, so ignore the error.
    if builder.try_init().is_ok() {
        log::debug!("Logger initialized at {level:?} level");
    }
}
