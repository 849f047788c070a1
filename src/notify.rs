//! Status reporting to the invoking environment
//!
//! The orchestrator reports decisions through a [`StatusSink`]. Under GitHub
//! Actions the messages become workflow commands (annotations on the run);
//! elsewhere they are printed to the terminal.

use anstream::println;
use owo_colors::OwoColorize;
use tracing::{error, info, warn};

/// Receiver for user-visible status messages
pub trait StatusSink: Send + Sync {
    /// Informational progress message
    fn info(&self, message: &str);

    /// Something went wrong but the run continues or ends successfully
    fn warning(&self, message: &str);

    /// The run failed
    fn failure(&self, message: &str);
}

/// Escape a message for use as workflow command data
///
/// `%`, `\r` and `\n` are percent-encoded so multi-line messages survive.
pub fn escape_command_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Sink emitting GitHub Actions workflow commands on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionsSink;

impl StatusSink for ActionsSink {
    fn info(&self, message: &str) {
        info!("{message}");
        println!("{message}");
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
        println!("::warning::{}", escape_command_data(message));
    }

    fn failure(&self, message: &str) {
        error!("{message}");
        println!("::error::{}", escape_command_data(message));
    }
}

/// Sink printing colored messages for interactive use
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn info(&self, message: &str) {
        info!("{message}");
        println!("{message}");
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
        println!("{} {message}", "warning:".yellow().bold());
    }

    fn failure(&self, message: &str) {
        error!("{message}");
        println!("{} {message}", "error:".red().bold());
    }
}
