// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the App Operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all application CRDs
pub const API_GROUP: &str = "application.giantswarm.io";

/// API version for all application CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Kind name for the `App` resource
pub const KIND_APP: &str = "App";

/// Kind name for the `Catalog` resource
pub const KIND_CATALOG: &str = "Catalog";

/// Kind name for the `Chart` resource
pub const KIND_CHART: &str = "Chart";

/// Project name, used as the `managed-by` label value on generated objects
pub const PROJECT_NAME: &str = "app-operator";

// ============================================================================
// Catalog Resolution Constants
// ============================================================================

/// Namespaces searched for a Catalog CR when `spec.catalogNamespace` is empty,
/// in order.
pub const CATALOG_NAMESPACES: [&str; 2] = ["default", "giantswarm"];

// ============================================================================
// Derived Object Naming
// ============================================================================

/// Suffix of the generated per-app values config map, `${app}-chart-values`
pub const CHART_VALUES_SUFFIX: &str = "-chart-values";

/// Suffix of the generated per-app secrets secret, `${app}-chart-secrets`
pub const CHART_SECRETS_SUFFIX: &str = "-chart-secrets";

/// Suffix of the per-namespace cluster values config map,
/// `${namespace}-cluster-values`
pub const CLUSTER_VALUES_SUFFIX: &str = "-cluster-values";

/// Data key holding YAML values in config sources and generated objects
pub const VALUES_KEY: &str = "values";

/// Data key holding kubeconfig bytes in a kubeconfig secret
pub const KUBECONFIG_KEY: &str = "kubeConfig";

// ============================================================================
// Chart Constants
// ============================================================================

/// Chart operator version label value used when the `App` carries none
pub const DEFAULT_CHART_OPERATOR_VERSION: &str = "1.0.0";

/// Notes annotation value on generated config maps and secrets
pub const NOTES_DO_NOT_EDIT: &str = "DO NOT EDIT. Values managed by app-operator.";

// ============================================================================
// Release Status Constants
// ============================================================================

/// Release status reported when the chart values merge failed on the
/// config map side
pub const STATUS_CONFIGMAP_MERGE_FAILED: &str = "configmap-merge-failed";

/// Release status reported when the chart values merge failed on the
/// secret side
pub const STATUS_SECRET_MERGE_FAILED: &str = "secret-merge-failed";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Base requeue duration after a reconciliation error (first attempt)
pub const ERROR_REQUEUE_BASE_SECS: u64 = 5;

/// Upper bound on the error requeue duration
pub const ERROR_REQUEUE_MAX_SECS: u64 = 300;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election retry period (2 seconds)
pub const DEFAULT_LEASE_RETRY_PERIOD_SECS: u64 = 2;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for the Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for the Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for the metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
