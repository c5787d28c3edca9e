use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use inbox::InboxService;
use inbox_slack::{
    CACHE_PREFIX_ENV, CALL_TIMEOUT_ENV, DATABASE_PATH_ENV, SlackConfiguration, build_service,
};
use shared::error::CommonError;
use tracing::{error, info};

/// Deliver due inbox reminders through Slack
#[derive(Parser, Debug)]
#[command(name = "inbox-reminders", version)]
pub struct Cli {
    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Seconds between passes
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    /// Local database file, overrides the environment
    #[arg(long, env = DATABASE_PATH_ENV)]
    database_path: Option<PathBuf>,

    /// Namespace prefix, overrides the environment
    #[arg(long, env = CACHE_PREFIX_ENV)]
    cache_prefix: Option<String>,

    /// Timeout for each Slack call in seconds, overrides the environment
    #[arg(long, env = CALL_TIMEOUT_ENV)]
    call_timeout_secs: Option<u64>,
}

impl Cli {
    fn apply_overrides(&self, mut config: SlackConfiguration) -> SlackConfiguration {
        if let Some(path) = &self.database_path {
            config.database_path = path.clone();
        }
        if let Some(prefix) = &self.cache_prefix {
            config.cache_prefix = Some(prefix.clone());
        }
        if let Some(secs) = self.call_timeout_secs {
            config.call_timeout_secs = Some(secs);
        }
        config
    }
}

fn log_error_chain(err: &(dyn Error)) {
    let mut current: Option<&(dyn Error)> = Some(err);

    while let Some(e) = current {
        eprintln!("Caused by: {e}");
        current = e.source();
    }
}

fn handle_error(err: &CommonError) {
    eprintln!("Error: {err}");
    log_error_chain(&err);
    ::std::process::exit(1);
}

async fn run_pass(service: &InboxService) -> Result<(), CommonError> {
    let report = service.dispatch_due_reminders().await?;
    if report.rate_limited {
        info!("Reminder pass stopped early, remaining reminders go out next pass");
    }
    Ok(())
}

async fn run_loop(service: &InboxService, interval: Duration) -> Result<(), CommonError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = run_pass(service).await {
                    error!(error = %e, name = e.name(), "Reminder pass failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down reminder dispatcher");
                return Ok(());
            }
        }
    }
}

async fn cmd_reminders(cli: Cli) -> Result<(), CommonError> {
    let config = cli.apply_overrides(SlackConfiguration::from_env()?);
    let (_db, service) = build_service(&config).await?;

    if cli.once {
        run_pass(&service).await
    } else {
        run_loop(&service, Duration::from_secs(cli.interval_secs)).await
    }
}

pub async fn run_cli(cli: Cli) -> Result<(), anyhow::Error> {
    if let Err(e) = cmd_reminders(cli).await {
        handle_error(&e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    mod unit {
        use super::super::*;

        #[test]
        fn test_cli_overrides_configuration() {
            let cli = Cli::try_parse_from([
                "inbox-reminders",
                "--once",
                "--database-path",
                "/tmp/inbox-test.db",
                "--cache-prefix",
                "staging",
            ])
            .unwrap();
            assert!(cli.once);
            assert_eq!(cli.interval_secs, 60);

            let config = cli.apply_overrides(SlackConfiguration {
                bot_token: "xoxb-token".to_string(),
                ..Default::default()
            });
            assert_eq!(config.database_path, PathBuf::from("/tmp/inbox-test.db"));
            assert_eq!(config.cache_prefix.as_deref(), Some("staging"));
        }

        #[test]
        fn test_cli_rejects_zero_interval() {
            assert!(Cli::try_parse_from(["inbox-reminders", "--interval-secs", "0"]).is_err());
        }
    }
}
