// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared operator context and the per-reconciliation scratchpad.
//!
//! [`Context`] is process-wide: the management client, validated settings,
//! the target-client factory and the per-key error backoff tracker. It is
//! wrapped in an `Arc` and handed to the controller.
//!
//! [`ReconcileCtx`] is scoped to a single reconciliation of a single App and
//! is never shared across keys. Chain units communicate exclusively through
//! it: the resolved catalog, the target-cluster client, observed
//! target-cluster health, an early-exit channel for chart-level problems and
//! the two cancellation flags.

use std::collections::HashMap;
use std::sync::Mutex;

use kube::Client;

use crate::crd::Catalog;
use crate::kubeconfig::TargetClientFactory;
use crate::retry::backoff_for_attempt;
use crate::settings::Settings;

/// Process-wide state shared by all reconciliations.
pub struct Context {
    /// Management cluster client.
    pub client: Client,

    /// Validated operator settings.
    pub settings: Settings,

    /// Factory for target-cluster clients.
    pub clients: TargetClientFactory,

    // object key -> consecutive error count, reset on success
    error_attempts: Mutex<HashMap<String, u32>>,
}

impl Context {
    /// Build the shared context.
    #[must_use]
    pub fn new(client: Client, settings: Settings) -> Self {
        let clients = TargetClientFactory::new(client.clone(), settings.http_client_timeout);
        Context {
            client,
            settings,
            clients,
            error_attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failed reconciliation for `object_key` and return how long to
    /// wait before the retry. Consecutive failures back off exponentially
    /// with jitter, bounded by [`crate::constants::ERROR_REQUEUE_MAX_SECS`].
    #[must_use]
    pub fn next_error_backoff(&self, object_key: &str) -> std::time::Duration {
        let mut attempts = self.error_attempts.lock().expect("backoff map poisoned");
        let attempt = attempts.entry(object_key.to_string()).or_insert(0);
        *attempt = attempt.saturating_add(1);
        backoff_for_attempt(*attempt)
    }

    /// Clear the error counter for `object_key` after a successful sweep.
    pub fn reset_error_backoff(&self, object_key: &str) {
        let mut attempts = self.error_attempts.lock().expect("backoff map poisoned");
        attempts.remove(object_key);
    }
}

/// Target-cluster health observed during chain execution.
#[derive(Clone, Debug, Default)]
pub struct TargetClusterStatus {
    /// The target cluster is being torn down.
    pub is_deleting: bool,

    /// The target cluster API cannot currently be reached.
    pub is_unavailable: bool,
}

/// Chart-level status recorded by an upstream unit before the Chart exists,
/// e.g. a values merge failure. The status unit prefers this over the
/// observed Chart status.
#[derive(Clone, Debug, Default)]
pub struct ChartStatusCtx {
    /// Release status string, empty when nothing was recorded.
    pub status: String,

    /// Human readable reason.
    pub reason: String,
}

/// Observed state shared between units of one reconciliation.
#[derive(Clone, Debug, Default)]
pub struct CtxStatus {
    /// Target cluster health flags.
    pub target_cluster: TargetClusterStatus,

    /// Early-exit chart status channel.
    pub chart: ChartStatusCtx,
}

/// Per-reconciliation scratchpad threaded through the resource chain.
#[derive(Default)]
pub struct ReconcileCtx {
    /// Catalog resolved for the App, set by the catalog unit.
    pub catalog: Option<Catalog>,

    /// Target cluster client, set by the clients unit. Equals the management
    /// client for in-cluster apps.
    pub target: Option<Client>,

    /// Health flags and the chart status channel.
    pub status: CtxStatus,

    /// Whether the desired state contains a generated config map; consumed
    /// by the chart unit when building `spec.config`.
    pub config_map_desired: bool,

    /// Whether the desired state contains a generated secret.
    pub secret_desired: bool,

    resource_canceled: bool,
    chain_canceled: bool,
}

impl ReconcileCtx {
    /// Cancel the remaining steps of the current unit only. Later units in
    /// the chain still run.
    pub fn cancel_resource(&mut self) {
        self.resource_canceled = true;
    }

    /// Cancel the remainder of the chain for this reconciliation. This is
    /// not an error and does not trigger backoff.
    pub fn cancel_chain(&mut self) {
        self.chain_canceled = true;
    }

    /// Whether the current unit should stop executing further steps.
    #[must_use]
    pub fn canceled(&self) -> bool {
        self.resource_canceled || self.chain_canceled
    }

    /// Whether the whole chain is canceled.
    #[must_use]
    pub fn chain_canceled(&self) -> bool {
        self.chain_canceled
    }

    /// Clear the per-unit cancellation between units; called by the engine
    /// after each unit finishes.
    pub fn finish_resource(&mut self) {
        self.resource_canceled = false;
    }

    /// Record a chart-level status for the status unit, e.g. a merge
    /// failure. First writer wins within one reconciliation.
    pub fn record_chart_status(&mut self, status: &str, reason: &str) {
        if self.status.chart.status.is_empty() {
            self.status.chart.status = status.to_string();
            self.status.chart.reason = reason.to_string();
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
