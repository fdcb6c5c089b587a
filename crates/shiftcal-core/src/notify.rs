use std::fmt;
use std::io::{self, IsTerminal, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Fire-and-forget message surface.
pub trait Notifier {
    fn notify(&self, title: &str, severity: Severity);
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, title: &str, severity: Severity) {
        (**self).notify(title, severity);
    }
}

/// Sends notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, severity: Severity) {
        match severity {
            Severity::Success => tracing::info!(title, "notification"),
            Severity::Error => tracing::error!(title, "notification"),
        }
    }
}

/// Prints notifications to stderr, green for success and red for errors.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    color: bool,
}

impl ConsoleNotifier {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, severity: Severity) {
        tracing::debug!(title, %severity, "notification");
        let code = match severity {
            Severity::Success => "32",
            Severity::Error => "31",
        };
        let mut err = io::stderr().lock();
        let result = if self.color && io::stderr().is_terminal() {
            writeln!(err, "\x1b[{code}m{title}\x1b[0m")
        } else {
            writeln!(err, "{title}")
        };
        if let Err(write_err) = result {
            tracing::warn!(error = %write_err, "failed writing notification");
        }
    }
}
