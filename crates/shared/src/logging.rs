use std::{env, str::FromStr};

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Install the process-wide tracing subscriber.
///
/// `RUST_LOG` drives the filter (defaults to `info`) and `LOG_FORMAT=json`
/// switches to structured output. Calling this twice is harmless: the second
/// attempt only logs a warning.
pub fn configure_logging() -> Result<(), anyhow::Error> {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_str(filter.as_str())?)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stdout);

    let installed = if is_json_format(env::var("LOG_FORMAT").ok().as_deref()) {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = installed {
        warn!(
            "Failed to initialize logging, potentially because we have initialized logging already: {}",
            e
        );
    }

    Ok(())
}

fn is_json_format(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v.eq_ignore_ascii_case("json"))
}
