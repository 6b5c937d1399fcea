//! Log subscriber for binaries embedding the engine.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `RUST_LOG` | filter directives (default: `warn,walletgate=info`) |
//! | `WALLETGATE_LOG_JSON` | `1` / `true` switches to JSON lines |

use crate::core::keys::env;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "warn,walletgate=info";

/// Install a global subscriber on stderr and announce the app it serves.
/// Safe to call twice; the second call keeps the first subscriber.
pub fn init_logging(app: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let use_json = json_enabled(std::env::var(env::LOG_JSON).ok().as_deref());

    let installed = if use_json {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::debug!(app, json = use_json, "logging initialised");
    }
}

fn json_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true") | Some("TRUE") | Some("yes"))
}
