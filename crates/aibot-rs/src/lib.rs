//! Public SDK surface for aibot.
//!
//! Re-exports the building blocks and wires them together from a loaded
//! config, the same way the `aibot` binary does.

/// Re-export for convenience.
pub use aibot_rs_config as config;
pub use aibot_rs_core as core;
/// Re-export for convenience.
pub use aibot_rs_protocol as protocol;
pub use aibot_rs_server as server;
/// Re-export for convenience.
pub use aibot_rs_tools as tools;
pub use aibot_rs_traces as traces;

mod app;

pub use app::{build_runner, load_config, render_rows};

/// Initialize `env_logger` with millisecond timestamps; `RUST_LOG` applies.
///
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
