//! Diagnostic logging.
//!
//! Logs go to stderr so stdout stays clean for command output. The filter
//! comes from `ATL_LOG` (e.g. `ATL_LOG=atelier=debug`); without it the level
//! is `warn`, or `debug` with `-v`. Set `ATL_LOG_FORMAT=json` for structured
//! lines.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "ATL_LOG";

/// Environment variable selecting the log line format.
pub const LOG_FORMAT_ENV: &str = "ATL_LOG_FORMAT";

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "atelier=debug,warn" } else { "warn" }
}

/// Build the filter: `ATL_LOG` wins, otherwise the verbosity default.
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}
