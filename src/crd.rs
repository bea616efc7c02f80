// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for app management.
//!
//! This module defines the Kubernetes Custom Resource Definitions used by the
//! App Operator to turn declarative `App` records into installable `Chart`
//! records.
//!
//! # Resource Types
//!
//! - [`App`] - User-authored record: "install chart X from catalog Y into
//!   cluster Z with this config"
//! - [`Catalog`] - Named chart repository with an HTTP storage URL and
//!   optional catalog-wide default config
//! - [`Chart`] - Generated record consumed by the downstream chart operator
//!
//! # Example: Creating an App
//!
//! ```rust,no_run
//! use app_operator::crd::{AppSpec, AppSpecKubeConfig};
//!
//! let spec = AppSpec {
//!     name: "prometheus".to_string(),
//!     namespace: "monitoring".to_string(),
//!     version: "1.2.3".to_string(),
//!     catalog: "default".to_string(),
//!     catalog_namespace: None,
//!     kube_config: AppSpecKubeConfig {
//!         in_cluster: true,
//!         secret: None,
//!         context: None,
//!     },
//!     config: None,
//!     user_config: None,
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a named object in a namespace.
///
/// Used throughout the CRDs to point at config maps, secrets and kubeconfig
/// secrets on the management cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedObjectRef {
    /// Name of the referenced object.
    pub name: String,

    /// Namespace of the referenced object.
    pub namespace: String,
}

// ============================================================================
// App
// ============================================================================

/// App represents a managed app that should be installed as a helm release
/// on a target cluster. The operator reconciles each App into a generated
/// Chart CR plus companion config map and secret.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "application.giantswarm.io",
    version = "v1alpha1",
    kind = "App",
    namespaced,
    shortname = "app",
    shortname = "apps",
    doc = "App declares a chart from a Catalog to be installed on a target cluster, together with layered configuration. The App Operator merges the configuration and generates a Chart CR for the chart operator to install.",
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Catalog","type":"string","jsonPath":".spec.catalog"}"#,
    printcolumn = r#"{"name":"Release","type":"string","jsonPath":".status.release.status"}"#
)]
#[kube(status = "AppStatus")]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Name of the chart in the catalog, also used as the helm release name.
    pub name: String,

    /// Namespace on the target cluster where the release is installed.
    pub namespace: String,

    /// Version of the chart to install.
    pub version: String,

    /// Name of the Catalog CR that hosts the chart.
    pub catalog: String,

    /// Namespace of the Catalog CR. When empty the operator looks in
    /// `default` and then `giantswarm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_namespace: Option<String>,

    /// How to reach the target cluster.
    pub kube_config: AppSpecKubeConfig,

    /// App-level configuration set by the cluster admin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<AppSpecConfig>,

    /// User-level configuration. Strongest precedence in the values merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_config: Option<AppSpecConfig>,
}

/// Target cluster connection settings for an [`App`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSpecKubeConfig {
    /// When true the release is installed on the management cluster and the
    /// secret reference is ignored.
    #[serde(default)]
    pub in_cluster: bool,

    /// Secret holding the kubeconfig bytes under the `kubeConfig` data key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<NamespacedObjectRef>,

    /// Context to select from the referenced kubeconfig.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AppSpecKubeConfigContext>,
}

/// Named kubeconfig context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSpecKubeConfigContext {
    /// Context name inside the kubeconfig.
    pub name: String,
}

/// A pair of optional config map / secret references contributing one layer
/// to the values merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSpecConfig {
    /// Config map holding YAML values under the `values` data key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<NamespacedObjectRef>,

    /// Secret holding YAML values under the `values` data key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<NamespacedObjectRef>,
}

/// Status reported back onto an [`App`], mirrored from the generated Chart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    /// Version of the app as reported by the chart (`appVersion` in
    /// Chart.yaml terms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// Release state observed on the target cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<AppStatusRelease>,

    /// Chart version that was last reconciled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Release sub-status of an [`AppStatus`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppStatusRelease {
    /// Timestamp of the last successful deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<String>,

    /// Human readable explanation when the release is not healthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Release status string, e.g. `deployed` or `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog represents a chart repository that Apps can reference by name.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "application.giantswarm.io",
    version = "v1alpha1",
    kind = "Catalog",
    namespaced,
    shortname = "catalog",
    doc = "Catalog names a chart repository with an HTTP storage URL and optional catalog-wide default configuration merged into every App using it.",
    printcolumn = r#"{"name":"URL","type":"string","jsonPath":".spec.storage.URL"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSpec {
    /// Display title of the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Where chart tarballs for this catalog are served from.
    pub storage: CatalogSpecStorage,

    /// Catalog-wide default configuration, weakest layer in the values merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CatalogSpecConfig>,
}

/// Storage backend of a [`Catalog`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSpecStorage {
    /// Storage type, currently always `helm`.
    #[serde(rename = "type")]
    pub storage_type: String,

    /// Base URL chart tarball URLs are derived from.
    #[serde(rename = "URL")]
    pub url: String,
}

/// Optional catalog-wide config references.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSpecConfig {
    /// Config map with catalog-level default values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<NamespacedObjectRef>,

    /// Secret with catalog-level default secret values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<NamespacedObjectRef>,
}

// ============================================================================
// Chart
// ============================================================================

/// Chart is the output of the App Operator: a fully resolved description of
/// one helm release, consumed by the downstream chart operator on the target
/// cluster.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "application.giantswarm.io",
    version = "v1alpha1",
    kind = "Chart",
    namespaced,
    shortname = "chart",
    doc = "Chart describes a single helm release to install: chart tarball URL, target namespace and the merged configuration produced by the App Operator.",
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Release","type":"string","jsonPath":".status.release.status"}"#,
    derive = "PartialEq",
    derive = "Default"
)]
#[kube(status = "ChartStatus")]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    /// Helm release name.
    pub name: String,

    /// Namespace on the target cluster where the release is installed.
    pub namespace: String,

    /// Chart version to install.
    pub version: String,

    /// Name of the catalog the chart came from.
    pub catalog: String,

    /// Fully resolved tarball URL:
    /// `${catalog.storage.URL}/${name}-${version}.tgz`.
    #[serde(rename = "tarballURL")]
    pub tarball_url: String,

    /// References to the merged config map / secret, present only when the
    /// merged payload is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ChartSpecConfig>,
}

/// Merged configuration references of a [`Chart`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpecConfig {
    /// Generated `${app}-chart-values` config map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<NamespacedObjectRef>,

    /// Generated `${app}-chart-secrets` secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<NamespacedObjectRef>,
}

/// Status written by the chart operator and read back by the status unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartStatus {
    /// Version of the app as packaged in the chart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// Explanation of the current release state when not healthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Release state of the installed chart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ChartStatusRelease>,

    /// Chart version that was installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Release sub-status of a [`ChartStatus`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartStatusRelease {
    /// Timestamp of the last successful deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<String>,

    /// Helm revision number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i32>,

    /// Release status string, e.g. `deployed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
