//! Footer status badge.

use std::fmt;
use tracing::warn;

use crate::api::{ServerStatus, ServiceState};
use crate::client::SecretService;

const UNKNOWN_VERSION: &str = "0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Green,
    Yellow,
    Red,
}

impl fmt::Display for BadgeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            BadgeColor::Green => "green",
            BadgeColor::Yellow => "yellow",
            BadgeColor::Red => "red",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub color: BadgeColor,
    pub version: String,
    pub status: Option<ServiceState>,
}

impl StatusBadge {
    /// Badge for a fetched status; `None` (fetch failed) keeps the defaults.
    pub fn from_status(status: Option<&ServerStatus>) -> Self {
        let Some(status) = status else {
            return Self {
                color: BadgeColor::Green,
                version: UNKNOWN_VERSION.to_string(),
                status: None,
            };
        };
        let color = match status.status {
            ServiceState::Unhealthy => BadgeColor::Red,
            ServiceState::Maintenance => BadgeColor::Yellow,
            // states the footer has no color for keep the default
            _ => BadgeColor::Green,
        };
        Self {
            color,
            version: status
                .version
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            status: Some(status.status.clone()),
        }
    }
}

/// Fetch the status once. Failures are logged and yield the default badge.
pub fn fetch_badge<S: SecretService>(service: &S) -> StatusBadge {
    match service.get_status() {
        Ok(status) => StatusBadge::from_status(Some(&status)),
        Err(err) => {
            warn!(error = %err, "could not fetch server status");
            StatusBadge::from_status(None)
        }
    }
}
