// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! Two annotation prefixes exist on purpose: the app-operator prefix marks
//! state owned by this operator on `App` CRs, while the chart-operator prefix
//! is carried onto generated `Chart` CRs for the downstream chart operator.

// ============================================================================
// Annotation Prefixes
// ============================================================================

/// Prefix for annotations owned by this operator, set on `App` CRs.
pub const APP_OPERATOR_PREFIX: &str = "app-operator.giantswarm.io";

/// Prefix for annotations consumed by the downstream chart operator, carried
/// onto generated `Chart` CRs.
pub const CHART_OPERATOR_PREFIX: &str = "chart-operator.giantswarm.io";

// ============================================================================
// Labels
// ============================================================================

/// Label selecting which operator process owns an `App` CR.
pub const APP_OPERATOR_VERSION_LABEL: &str = "app-operator.giantswarm.io/version";

/// Label on generated `Chart` CRs naming the chart operator version that
/// should install them.
pub const CHART_OPERATOR_VERSION_LABEL: &str = "chart-operator.giantswarm.io/version";

/// Label naming the workload cluster an `App` belongs to.
pub const CLUSTER_LABEL: &str = "giantswarm.io/cluster";

/// Label marking generated objects as managed by this operator.
pub const MANAGED_BY_LABEL: &str = "giantswarm.io/managed-by";

/// Reserved version label value handled only by a `unique` mode process.
pub const UNIQUE_APP_VERSION: &str = "0.0.0";

// ============================================================================
// Annotations
// ============================================================================

/// Annotation suspending the create/update sweep for an `App`.
pub const PAUSED_ANNOTATION: &str = "app-operator.giantswarm.io/paused";

/// Annotation suffix naming why an object is cordoned.
pub const CORDON_REASON_SUFFIX: &str = "cordon-reason";

/// Annotation suffix naming until when an object is cordoned.
pub const CORDON_UNTIL_SUFFIX: &str = "cordon-until";

/// Annotation key for the editing warning on generated objects.
pub const NOTES_ANNOTATION: &str = "app-operator.giantswarm.io/notes";

/// Annotation on generated `Chart` CRs naming the status webhook endpoint.
pub const WEBHOOK_URL_ANNOTATION: &str = "chart-operator.giantswarm.io/webhook-url";

// ============================================================================
// Finalizers
// ============================================================================

/// Prefix of the per-app finalizer; the full string is
/// `app-operator.giantswarm.io/app-${name}`.
pub const FINALIZER_PREFIX: &str = "app-operator.giantswarm.io/app-";
