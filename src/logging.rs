//! Console logging and progress feedback.

use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` when `verbose`.
/// Logs go to stderr so stdout only carries the run summary.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
    if let Err(e) = installed {
        // An earlier subscriber keeps receiving the events.
        tracing::debug!("Logging already initialised: {}", e);
    }
}

/// Starts a spinner showing `msg` until finished by the caller.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_keeps_the_first_subscriber() {
        init(false);
        init(true);
        tracing::info!("still logging");
    }

    #[test]
    fn spinner_carries_its_message() {
        let pb = spinner("Reading patch.yearly");
        assert_eq!(pb.message(), "Reading patch.yearly");
        pb.finish_and_clear();
    }
}
