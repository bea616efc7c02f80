// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator process configuration.
//!
//! All settings come from `APP_OPERATOR_*` environment variables. Required
//! values that are missing or zero make startup fail with
//! [`Error::InvalidConfig`], so a misconfigured deployment exits non-zero
//! instead of limping along.

use std::time::Duration;

use crate::errors::{Error, Result};
use crate::labels::{APP_OPERATOR_VERSION_LABEL, UNIQUE_APP_VERSION};

/// Validated operator settings.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Namespace on the target cluster holding all generated `Chart`, config
    /// map and secret objects.
    pub chart_namespace: String,

    /// Registry prefix merged into every generated values payload.
    pub image_registry: String,

    /// Upper bound on any HTTP call to a target cluster.
    pub http_client_timeout: Duration,

    /// Interval at which every App is re-reconciled absent watch events.
    pub resync_period: Duration,

    /// `unique` mode: additionally handle Apps carrying the reserved
    /// `0.0.0` version label.
    pub unique_app: bool,

    /// Base URL of the status webhook announced to the chart operator.
    pub webhook_base_url: Option<String>,

    /// Bearer token for the status webhook.
    pub webhook_auth_token: Option<String>,

    /// Version of this operator process, matched against the App version
    /// label.
    pub version: String,
}

impl Settings {
    /// Load settings from `APP_OPERATOR_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when a required variable is missing,
    /// empty or zero.
    pub fn from_env() -> Result<Self> {
        let settings = Settings {
            chart_namespace: env_string("APP_OPERATOR_CHART_NAMESPACE"),
            image_registry: env_string("APP_OPERATOR_IMAGE_REGISTRY"),
            http_client_timeout: Duration::from_secs(env_u64(
                "APP_OPERATOR_HTTP_CLIENT_TIMEOUT_SECS",
            )),
            resync_period: Duration::from_secs(env_u64("APP_OPERATOR_RESYNC_PERIOD_SECS")),
            unique_app: std::env::var("APP_OPERATOR_UNIQUE_APP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            webhook_base_url: std::env::var("APP_OPERATOR_WEBHOOK_BASE_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            webhook_auth_token: std::env::var("APP_OPERATOR_WEBHOOK_AUTH_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            version: std::env::var("APP_OPERATOR_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.chart_namespace.is_empty() {
            return Err(Error::InvalidConfig("chart_namespace"));
        }
        if self.image_registry.is_empty() {
            return Err(Error::InvalidConfig("image_registry"));
        }
        if self.http_client_timeout.is_zero() {
            return Err(Error::InvalidConfig("http_client_timeout"));
        }
        if self.resync_period.is_zero() {
            return Err(Error::InvalidConfig("resync_period"));
        }
        Ok(())
    }

    /// Label selector binding the watch to Apps this process owns.
    ///
    /// A `versioned` process handles its own version only; a `unique` process
    /// additionally handles the reserved `0.0.0` label, so two operator
    /// versions can coexist during an upgrade without fighting over the same
    /// App.
    #[must_use]
    pub fn version_selector(&self) -> String {
        if self.unique_app {
            format!(
                "{APP_OPERATOR_VERSION_LABEL} in ({UNIQUE_APP_VERSION},{})",
                self.version
            )
        } else {
            format!("{APP_OPERATOR_VERSION_LABEL}={}", self.version)
        }
    }
}

fn env_string(var: &str) -> String {
    std::env::var(var).unwrap_or_default()
}

fn env_u64(var: &str) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod settings_tests;
