//! Display collaborators the hosting view supplies to the core: a sink for
//! user-visible messages and a navigator for moving between views.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Message severity, named after the service's bootstrap variants.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Default,
    Primary,
    Secondary,
    Danger,
    Warning,
    Success,
    Info,
    Light,
    Dark,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Default => "default",
            Severity::Primary => "primary",
            Severity::Secondary => "secondary",
            Severity::Danger => "danger",
            Severity::Warning => "warning",
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Light => "light",
            Severity::Dark => "dark",
        };
        f.write_str(name)
    }
}

/// A message flashed by the service, carried in every response envelope.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerMessage {
    pub message: String,
    pub variant: Severity,
    pub title: String,
}

pub trait Notifier: Send + Sync {
    /// Display lifetime is the sink's business.
    fn notify(&self, text: &str, severity: Severity, title: &str);
}

pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

pub(crate) fn forward_messages(notifier: &dyn Notifier, messages: &[ServerMessage]) {
    for m in messages {
        notifier.notify(&m.message, m.variant, &m.title);
    }
}

/// Writes notifications to the log. Used by the CLI in place of toasts.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, text: &str, severity: Severity, title: &str) {
        match severity {
            Severity::Danger => error!(%severity, title, "{}", text),
            Severity::Warning => warn!(%severity, title, "{}", text),
            _ => info!(%severity, title, "{}", text),
        }
    }
}

#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_to(&self, path: &str) {
        info!(path, "Navigating");
    }
}
