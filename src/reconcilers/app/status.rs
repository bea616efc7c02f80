// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status propagation unit.
//!
//! Mirrors the release status of the generated Chart on the target cluster
//! back onto the App on the management cluster. Writes go through the status
//! subresource so spec changes are never clobbered, and only when the
//! computed status differs from what the App already carries.
//!
//! A chart-level problem recorded upstream in the reconciliation context
//! (e.g. a values merge failure) takes precedence over the observed Chart
//! status, so users see the root cause even before any Chart exists.

#[allow(clippy::wildcard_imports)]
use super::types::*;

use crate::crd::ChartStatus;
use crate::settings::Settings;

/// Chain unit mirroring Chart status onto the App.
pub struct StatusResource {
    chart_namespace: String,
}

impl StatusResource {
    /// Build the unit from operator settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        StatusResource {
            chart_namespace: settings.chart_namespace.clone(),
        }
    }
}

/// Map an observed Chart status onto the App status shape.
fn app_status_from_chart(chart_status: &ChartStatus) -> AppStatus {
    let release = chart_status.release.clone().unwrap_or_default();

    AppStatus {
        app_version: chart_status.app_version.clone(),
        release: Some(AppStatusRelease {
            last_deployed: release.last_deployed,
            reason: chart_status.reason.clone(),
            status: release.status,
        }),
        version: chart_status.version.clone(),
    }
}

#[async_trait]
impl AppResource for StatusResource {
    fn name(&self) -> &'static str {
        "status"
    }

    fn observes_while_suspended(&self) -> bool {
        true
    }

    async fn ensure_created(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<()> {
        if rctx.status.target_cluster.is_deleting {
            debug!("target cluster is being deleted, no need to observe status");
            return Ok(());
        }

        let desired_status = if rctx.status.chart.status.is_empty() {
            if rctx.status.target_cluster.is_unavailable {
                debug!("target cluster is unavailable, no need to observe status");
                return Ok(());
            }

            let Some(target) = rctx.target.clone() else {
                return Ok(());
            };

            let name = app.name_any();

            debug!(
                "finding status for chart {:?} in namespace {:?}",
                name, self.chart_namespace
            );

            let api: Api<Chart> = Api::namespaced(target, &self.chart_namespace);
            let chart = match api.get(&name).await {
                Ok(chart) => chart,
                Err(err) if is_kube_not_found(&err) => {
                    debug!(
                        "did not find chart {:?} in namespace {:?}",
                        name, self.chart_namespace
                    );
                    return Ok(());
                }
                Err(err) if is_api_unavailable(&err) => {
                    debug!("target cluster is unavailable, canceling reconciliation");
                    rctx.status.target_cluster.is_unavailable = true;
                    rctx.cancel_chain();
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            // The chart operator has not reported anything yet; the App
            // keeps its current status until the next sweep.
            let Some(chart_status) = chart.status else {
                debug!("chart {:?} has no status yet", name);
                return Ok(());
            };

            app_status_from_chart(&chart_status)
        } else {
            // An upstream unit already knows what is wrong with this chart.
            AppStatus {
                release: Some(AppStatusRelease {
                    last_deployed: None,
                    reason: Some(rctx.status.chart.reason.clone()),
                    status: Some(rctx.status.chart.status.clone()),
                }),
                ..AppStatus::default()
            }
        };

        if desired_status == key::app_status(app) {
            debug!("status already set for app {:?}", app.name_any());
            return Ok(());
        }

        let namespace = app.namespace().unwrap_or_default();
        let name = app.name_any();

        info!("setting status for app {:?} in namespace {:?}", name, namespace);

        let api: Api<App> = Api::namespaced(ctx.client.clone(), &namespace);

        let patch = serde_json::json!({ "status": desired_status });
        match api
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 409 => {
                Err(Error::Conflict(format!("app {namespace}/{name} status")))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure_deleted(
        &self,
        _ctx: &Context,
        _rctx: &mut ReconcileCtx,
        _app: &App,
    ) -> Result<()> {
        // Nothing to tear down; the App is going away with its status.
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
