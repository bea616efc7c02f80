// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the App Operator.
//!
//! Every fallible path in the resource chain returns [`Error`], so the engine
//! can classify failures, count them by kind and decide between surfacing,
//! retrying and soft-skipping. Target-cluster unavailability is deliberately
//! *not* an error: units record it on the reconciliation context and cancel
//! the chain instead.

use thiserror::Error;

/// Errors produced by the operator.
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value is missing or empty at startup. Fatal.
    #[error("invalid config: {0} must not be empty")]
    InvalidConfig(&'static str),

    /// An observed object does not have the expected shape.
    #[error("wrong type: expected {expected}, got {got}")]
    WrongType {
        /// What the caller expected to find.
        expected: &'static str,
        /// What was actually found.
        got: String,
    },

    /// An observed object is missing a value that must be present.
    #[error("empty value: {0}")]
    EmptyValue(String),

    /// A referenced catalog, config map, secret or data key is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency failure on a status update; retried on the
    /// next sweep.
    #[error("conflict updating {0}")]
    Conflict(String),

    /// Kubernetes API error.
    #[error(transparent)]
    Kube(#[from] kube::Error),

    /// Kubeconfig bytes in a referenced secret could not be parsed.
    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// YAML decoding or encoding failure in the values merger.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failure building a patch.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable kind string for logs and the per-kind error metric.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "invalid_config",
            Error::WrongType { .. } => "wrong_type",
            Error::EmptyValue(_) => "empty_value",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Kube(_) => "kube_api",
            Error::Kubeconfig(_) => "kubeconfig",
            Error::Yaml(_) => "yaml",
            Error::Json(_) => "json",
        }
    }

    /// Whether this error means a referenced object is absent, either as our
    /// own [`Error::NotFound`] or as a Kubernetes 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Kube(err) => is_kube_not_found(err),
            _ => false,
        }
    }

    /// Whether this error is an optimistic-concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Conflict(_) => true,
            Error::Kube(kube::Error::Api(resp)) => resp.code == 409,
            _ => false,
        }
    }
}

/// Whether a Kubernetes API error is a 404.
#[must_use]
pub fn is_kube_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

/// Whether a Kubernetes API error means the API server cannot currently be
/// reached: transport failures and gateway-style 5xx responses.
///
/// Units use this to classify target-cluster calls as soft skips instead of
/// burning retries on a dead cluster.
#[must_use]
pub fn is_api_unavailable(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(resp) => matches!(resp.code, 502 | 503 | 504),
        // Network/connection errors surface as service errors
        kube::Error::Service(_) => true,
        _ => false,
    }
}

/// Convenience alias used throughout the resource chain.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
