// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # App Operator - Declarative App Management for Kubernetes
//!
//! The App Operator is a Kubernetes controller written in Rust that turns
//! user-authored `App` records into concrete `Chart` records installable by
//! a downstream chart operator.
//!
//! ## Overview
//!
//! This library provides the core functionality of the operator, including:
//!
//! - Custom Resource Definitions for `App`, `Catalog` and `Chart`
//! - The resource chain reconciling every `App`: catalog resolution, target
//!   cluster switching, values merging, config map / secret / Chart
//!   materialization and status propagation
//! - Deterministic layered merging of catalog-, cluster-, app- and
//!   user-level configuration
//! - Finalizer-driven teardown across clusters
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - Reconciliation engine and the resource chain
//! - [`values`] - Layered configuration merging
//! - [`kubeconfig`] - Target-cluster client factory
//!
//! ## Example
//!
//! ```rust,no_run
//! use app_operator::crd::{AppSpec, AppSpecKubeConfig};
//!
//! // Declare an app installed on the management cluster
//! let spec = AppSpec {
//!     name: "cert-manager".to_string(),
//!     namespace: "kube-system".to_string(),
//!     version: "1.1.0".to_string(),
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

pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod key;
pub mod kubeconfig;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod retry;
pub mod settings;
pub mod values;

#[cfg(test)]
pub mod testing;
