// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed accessors over `App`, `Catalog` and `Chart` CRs.
//!
//! Every name derivation, label lookup and annotation check used by the
//! resource chain lives here, so naming conventions are defined in exactly
//! one place. Accessors never panic: missing metadata degrades to empty
//! strings or `None`.

use chrono::{DateTime, NaiveDateTime, Utc};
use kube::ResourceExt;

use crate::crd::{App, AppStatus, Catalog, Chart, NamespacedObjectRef};
use crate::labels::{
    APP_OPERATOR_PREFIX, APP_OPERATOR_VERSION_LABEL, CHART_OPERATOR_PREFIX, CLUSTER_LABEL,
    CORDON_REASON_SUFFIX, CORDON_UNTIL_SUFFIX, FINALIZER_PREFIX, PAUSED_ANNOTATION,
};

/// Timestamp layout used by cordon-until annotations, next to RFC 3339.
const CORDON_UNTIL_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

// ============================================================================
// App spec accessors
// ============================================================================

/// Chart name in the catalog, also the helm release name.
#[must_use]
pub fn app_name(app: &App) -> &str {
    &app.spec.name
}

/// Namespace on the target cluster where the release is installed.
#[must_use]
pub fn namespace(app: &App) -> &str {
    &app.spec.namespace
}

/// Chart version to install.
#[must_use]
pub fn version(app: &App) -> &str {
    &app.spec.version
}

/// Name of the referenced Catalog CR.
#[must_use]
pub fn catalog_name(app: &App) -> &str {
    &app.spec.catalog
}

/// Explicit catalog namespace, when set and non-empty.
#[must_use]
pub fn catalog_namespace(app: &App) -> Option<&str> {
    app.spec
        .catalog_namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
}

/// Whether the release targets the management cluster itself.
#[must_use]
pub fn in_cluster(app: &App) -> bool {
    app.spec.kube_config.in_cluster
}

/// Reference to the kubeconfig secret for a remote target cluster.
#[must_use]
pub fn kube_config_secret(app: &App) -> Option<&NamespacedObjectRef> {
    app.spec.kube_config.secret.as_ref()
}

/// Kubeconfig context name to select, when set.
#[must_use]
pub fn kube_config_context_name(app: &App) -> Option<&str> {
    app.spec.kube_config.context.as_ref().map(|c| c.name.as_str())
}

/// App-level config map reference.
#[must_use]
pub fn app_config_map(app: &App) -> Option<&NamespacedObjectRef> {
    app.spec.config.as_ref()?.config_map.as_ref()
}

/// App-level secret reference.
#[must_use]
pub fn app_secret(app: &App) -> Option<&NamespacedObjectRef> {
    app.spec.config.as_ref()?.secret.as_ref()
}

/// User-level config map reference.
#[must_use]
pub fn user_config_map(app: &App) -> Option<&NamespacedObjectRef> {
    app.spec.user_config.as_ref()?.config_map.as_ref()
}

/// User-level secret reference.
#[must_use]
pub fn user_secret(app: &App) -> Option<&NamespacedObjectRef> {
    app.spec.user_config.as_ref()?.secret.as_ref()
}

/// Current status of the App, default when none was written yet.
#[must_use]
pub fn app_status(app: &App) -> AppStatus {
    app.status.clone().unwrap_or_default()
}

// ============================================================================
// Derived object naming
// ============================================================================

/// Name of the generated values config map, `${app}-chart-values`.
#[must_use]
pub fn chart_config_map_name(app: &App) -> String {
    format!("{}{}", app.name_any(), crate::constants::CHART_VALUES_SUFFIX)
}

/// Name of the generated secrets secret, `${app}-chart-secrets`.
#[must_use]
pub fn chart_secret_name(app: &App) -> String {
    format!("{}{}", app.name_any(), crate::constants::CHART_SECRETS_SUFFIX)
}

/// Name of the per-namespace cluster values config map,
/// `${namespace}-cluster-values`.
#[must_use]
pub fn cluster_values_config_map_name(app: &App) -> String {
    format!(
        "{}{}",
        app.namespace().unwrap_or_default(),
        crate::constants::CLUSTER_VALUES_SUFFIX
    )
}

/// Per-app finalizer string, `app-operator.giantswarm.io/app-${name}`.
#[must_use]
pub fn finalizer_name(app: &App) -> String {
    format!("{FINALIZER_PREFIX}{}", app.name_any())
}

// ============================================================================
// Labels
// ============================================================================

/// Value of the operator version label, empty when absent.
#[must_use]
pub fn version_label(app: &App) -> String {
    app.labels()
        .get(APP_OPERATOR_VERSION_LABEL)
        .cloned()
        .unwrap_or_default()
}

/// Workload cluster id from the `cluster` label, when present.
#[must_use]
pub fn cluster_id(app: &App) -> Option<String> {
    app.labels().get(CLUSTER_LABEL).cloned()
}

// ============================================================================
// Lifecycle checks
// ============================================================================

/// Whether the App carries a deletion timestamp.
#[must_use]
pub fn is_deleted(app: &App) -> bool {
    app.metadata.deletion_timestamp.is_some()
}

/// Whether the App is paused via the pause annotation.
#[must_use]
pub fn is_paused(app: &App) -> bool {
    app.annotations()
        .get(PAUSED_ANNOTATION)
        .is_some_and(|v| v == "true")
}

/// Whether the App is cordoned.
///
/// Both the `cordon-reason` and `cordon-until` annotations (app-operator
/// prefix) must be present. An expired `cordon-until` lifts the cordon; a
/// timestamp that does not parse keeps it.
#[must_use]
pub fn is_app_cordoned(app: &App) -> bool {
    let annotations = app.annotations();
    let reason = annotations.get(&format!("{APP_OPERATOR_PREFIX}/{CORDON_REASON_SUFFIX}"));
    let until = annotations.get(&format!("{APP_OPERATOR_PREFIX}/{CORDON_UNTIL_SUFFIX}"));

    match (reason, until) {
        (Some(_), Some(until)) => !is_cordon_expired(until, Utc::now()),
        _ => false,
    }
}

/// Whether a generated Chart is cordoned, using the chart-operator prefix.
#[must_use]
pub fn is_chart_cordoned(chart: &Chart) -> bool {
    let annotations = chart.annotations();
    let reason = annotations.get(&format!("{CHART_OPERATOR_PREFIX}/{CORDON_REASON_SUFFIX}"));
    let until = annotations.get(&format!("{CHART_OPERATOR_PREFIX}/{CORDON_UNTIL_SUFFIX}"));

    match (reason, until) {
        (Some(_), Some(until)) => !is_cordon_expired(until, Utc::now()),
        _ => false,
    }
}

/// Whether a cordon-until timestamp lies in the past relative to `now`.
///
/// Accepts RFC 3339 and the legacy `%Y-%m-%dT%H:%M:%S` layout (read as UTC).
/// Unparseable values count as not expired, so a malformed annotation fails
/// closed.
#[must_use]
pub fn is_cordon_expired(until: &str, now: DateTime<Utc>) -> bool {
    if let Ok(ts) = DateTime::parse_from_rfc3339(until) {
        return ts.with_timezone(&Utc) < now;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(until, CORDON_UNTIL_LAYOUT) {
        return naive.and_utc() < now;
    }
    false
}

// ============================================================================
// Catalog accessors
// ============================================================================

/// Storage base URL of a catalog.
#[must_use]
pub fn catalog_storage_url(catalog: &Catalog) -> &str {
    &catalog.spec.storage.url
}

/// Catalog-level config map reference.
#[must_use]
pub fn catalog_config_map(catalog: &Catalog) -> Option<&NamespacedObjectRef> {
    catalog.spec.config.as_ref()?.config_map.as_ref()
}

/// Catalog-level secret reference.
#[must_use]
pub fn catalog_secret(catalog: &Catalog) -> Option<&NamespacedObjectRef> {
    catalog.spec.config.as_ref()?.secret.as_ref()
}

/// Tarball URL of the chart an App references,
/// `${catalog.storage.URL}/${name}-${version}.tgz`.
#[must_use]
pub fn tarball_url(app: &App, catalog: &Catalog) -> String {
    format!(
        "{}/{}-{}.tgz",
        catalog_storage_url(catalog).trim_end_matches('/'),
        app_name(app),
        version(app)
    )
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod key_tests;
