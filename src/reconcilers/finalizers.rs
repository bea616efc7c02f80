// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for `App` CRs.
//!
//! Generated Chart, config map and secret objects may live on a different
//! cluster than the App, so owner references cannot protect them; the
//! per-app finalizer `app-operator.giantswarm.io/app-${name}` is the only
//! safe mechanism. The engine attaches it before the first writing sweep and
//! detaches it only after a delete sweep completed with no error and no
//! cancellation.

use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

use crate::crd::App;
use crate::errors::Result;
use crate::key;

/// Add the per-app finalizer if not already present. Idempotent.
///
/// # Errors
///
/// Returns an error when the metadata patch fails.
pub async fn ensure_finalizer(client: &Client, app: &App) -> Result<()> {
    let finalizer = key::finalizer_name(app);
    let namespace = app.namespace().unwrap_or_default();
    let name = app.name_any();

    if app
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.contains(&finalizer))
    {
        return Ok(());
    }

    info!("adding finalizer {} to app {}/{}", finalizer, namespace, name);

    let mut finalizers = app.meta().finalizers.clone().unwrap_or_default();
    finalizers.push(finalizer);

    let api: Api<App> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(())
}

/// Remove the per-app finalizer if present. Idempotent.
///
/// # Errors
///
/// Returns an error when the metadata patch fails.
pub async fn remove_finalizer(client: &Client, app: &App) -> Result<()> {
    let finalizer = key::finalizer_name(app);
    let namespace = app.namespace().unwrap_or_default();
    let name = app.name_any();

    if app
        .meta()
        .finalizers
        .as_ref()
        .is_none_or(|f| !f.contains(&finalizer))
    {
        return Ok(());
    }

    info!(
        "removing finalizer {} from app {}/{}",
        finalizer, namespace, name
    );

    let mut finalizers = app.meta().finalizers.clone().unwrap_or_default();
    finalizers.retain(|f| f != &finalizer);

    let api: Api<App> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
