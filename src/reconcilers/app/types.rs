// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared types and imports for the App resource chain.
//!
//! This module provides common type re-exports and shared utilities
//! used across the app reconciliation units.

#![allow(clippy::wildcard_imports)]

// Re-export commonly used types from parent modules
pub use crate::constants::{
    KIND_CHART, NOTES_DO_NOT_EDIT, PROJECT_NAME, STATUS_CONFIGMAP_MERGE_FAILED,
    STATUS_SECRET_MERGE_FAILED,
};
pub use crate::context::{Context, ReconcileCtx};
pub use crate::crd::{
    App, AppStatus, AppStatusRelease, Catalog, Chart, ChartSpec, ChartSpecConfig,
    NamespacedObjectRef,
};
pub use crate::errors::{is_api_unavailable, is_kube_not_found, Error, Result};
pub use crate::key;
pub use crate::labels::{
    CHART_OPERATOR_PREFIX, CHART_OPERATOR_VERSION_LABEL, MANAGED_BY_LABEL, NOTES_ANNOTATION,
    WEBHOOK_URL_ANNOTATION,
};
pub use crate::reconcilers::resources::{AppResource, ChainResource, Change, Crud};

// Re-export commonly used Kubernetes types
pub use k8s_openapi::{
    api::core::v1::{ConfigMap, Secret},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
    ByteString,
};

// Re-export kube-rs types
pub use kube::{
    api::{DeleteParams, Patch, PatchParams, PostParams},
    client::Client,
    Api, ResourceExt,
};

// Re-export common utilities
pub use async_trait::async_trait;
pub use std::collections::BTreeMap;
pub use tracing::{debug, info, warn};
