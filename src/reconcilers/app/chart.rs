// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Chart generation unit.
//!
//! Produces the Chart CR the downstream chart operator installs: app name in
//! the chart namespace, tarball URL derived from the resolved catalog, and
//! config references pointing at the generated config map / secret when they
//! exist. Exactly one Chart exists per App, with the same lifetime.

#[allow(clippy::wildcard_imports)]
use super::types::*;

use crate::constants::DEFAULT_CHART_OPERATOR_VERSION;
use crate::settings::Settings;

/// Chain unit owning the generated Chart CR.
pub struct ChartResource {
    chart_namespace: String,
    webhook_base_url: Option<String>,
}

impl ChartResource {
    /// Build the unit from operator settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        ChartResource {
            chart_namespace: settings.chart_namespace.clone(),
            webhook_base_url: settings.webhook_base_url.clone(),
        }
    }

    fn desired_chart(&self, app: &App, catalog: &Catalog, rctx: &ReconcileCtx) -> Chart {
        let config = chart_config(app, rctx, &self.chart_namespace);

        let mut chart = Chart::new(
            &app.name_any(),
            ChartSpec {
                name: key::app_name(app).to_string(),
                namespace: key::namespace(app).to_string(),
                version: key::version(app).to_string(),
                catalog: key::catalog_name(app).to_string(),
                tarball_url: key::tarball_url(app, catalog),
                config,
            },
        );

        chart.metadata.namespace = Some(self.chart_namespace.clone());
        chart.metadata.labels = Some(chart_labels(app));
        let annotations = self.chart_annotations(app);
        if !annotations.is_empty() {
            chart.metadata.annotations = Some(annotations);
        }

        chart
    }

    /// Annotations for the generated Chart: everything chart-operator
    /// prefixed carried over from the App (chart-level cordons travel this
    /// way), plus the status webhook endpoint when configured.
    fn chart_annotations(&self, app: &App) -> BTreeMap<String, String> {
        let mut annotations: BTreeMap<String, String> = app
            .annotations()
            .iter()
            .filter(|(k, _)| k.starts_with(CHART_OPERATOR_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(base_url) = &self.webhook_base_url {
            annotations.insert(
                WEBHOOK_URL_ANNOTATION.to_string(),
                format!(
                    "{}/{}/{}",
                    base_url.trim_end_matches('/'),
                    app.namespace().unwrap_or_default(),
                    app.name_any()
                ),
            );
        }

        annotations
    }
}

fn chart_labels(app: &App) -> BTreeMap<String, String> {
    let chart_operator_version = app
        .labels()
        .get(CHART_OPERATOR_VERSION_LABEL)
        .cloned()
        .unwrap_or_else(|| DEFAULT_CHART_OPERATOR_VERSION.to_string());

    BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), PROJECT_NAME.to_string()),
        (
            CHART_OPERATOR_VERSION_LABEL.to_string(),
            chart_operator_version,
        ),
    ])
}

fn chart_config(app: &App, rctx: &ReconcileCtx, chart_namespace: &str) -> Option<ChartSpecConfig> {
    if !rctx.config_map_desired && !rctx.secret_desired {
        return None;
    }

    Some(ChartSpecConfig {
        config_map: rctx.config_map_desired.then(|| NamespacedObjectRef {
            name: key::chart_config_map_name(app),
            namespace: chart_namespace.to_string(),
        }),
        secret: rctx.secret_desired.then(|| NamespacedObjectRef {
            name: key::chart_secret_name(app),
            namespace: chart_namespace.to_string(),
        }),
    })
}

/// Equality over the fields this operator owns: name, spec, labels and
/// annotations. Server-managed metadata is ignored.
fn charts_equal(current: &Chart, desired: &Chart) -> bool {
    current.metadata.name == desired.metadata.name
        && current.spec == desired.spec
        && current.metadata.labels == desired.metadata.labels
        && current.metadata.annotations == desired.metadata.annotations
}

#[async_trait]
impl ChainResource for ChartResource {
    type State = Chart;

    const NAME: &'static str = "chart";

    async fn current_state(
        &self,
        _ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<Option<Chart>> {
        let Some(target) = rctx.target.clone() else {
            return Ok(None);
        };

        let name = app.name_any();

        debug!("finding chart {:?}", name);

        let api: Api<Chart> = Api::namespaced(target, &self.chart_namespace);

        match api.get(&name).await {
            Ok(chart) => Ok(Some(chart)),
            Err(err) if is_kube_not_found(&err) => {
                debug!(
                    "did not find chart {:?} in namespace {:?}",
                    name, self.chart_namespace
                );
                Ok(None)
            }
            Err(err) if is_api_unavailable(&err) => {
                debug!("target cluster is unavailable, canceling reconciliation");
                rctx.status.target_cluster.is_unavailable = true;
                rctx.cancel_chain();
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn desired_state(
        &self,
        _ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<Option<Chart>> {
        if key::is_deleted(app) {
            let mut chart = Chart::new(&app.name_any(), ChartSpec::default());
            chart.metadata.namespace = Some(self.chart_namespace.clone());
            return Ok(Some(chart));
        }

        let catalog = rctx
            .catalog
            .clone()
            .ok_or_else(|| Error::EmptyValue("catalog not resolved".to_string()))?;

        Ok(Some(self.desired_chart(app, &catalog, rctx)))
    }

    fn states_equal(&self, current: &Chart, desired: &Chart) -> bool {
        charts_equal(current, desired)
    }

    fn new_update_change(
        &self,
        current: Option<&Chart>,
        desired: Option<&Chart>,
    ) -> Option<Change<Chart>> {
        match (current, desired) {
            (Some(current), Some(desired)) if !charts_equal(current, desired) => {
                // Replace needs the live resource version.
                let mut desired = desired.clone();
                desired.metadata.resource_version = current.metadata.resource_version.clone();
                Some(Change::Update(desired))
            }
            _ => None,
        }
    }

    async fn apply_change(
        &self,
        _ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
        change: Change<Chart>,
    ) -> Result<()> {
        let Some(target) = rctx.target.clone() else {
            return Ok(());
        };

        let api: Api<Chart> = Api::namespaced(target, &self.chart_namespace);

        let result = match &change {
            Change::Create(chart) => {
                let name = chart.name_any();
                info!(
                    "creating chart {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.create(&PostParams::default(), chart).await {
                    Ok(_) => {
                        crate::metrics::record_resource_created(KIND_CHART);
                        Ok(())
                    }
                    Err(kube::Error::Api(resp)) if resp.code == 409 => {
                        debug!("chart {:?} already created", name);
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Change::Update(chart) => {
                let name = chart.name_any();
                info!(
                    "updating chart {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.replace(&name, &PostParams::default(), chart).await {
                    Ok(_) => {
                        crate::metrics::record_resource_updated(KIND_CHART);
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Change::Delete(chart) => {
                let name = chart.name_any();
                info!(
                    "deleting chart {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.delete(&name, &DeleteParams::default()).await {
                    Ok(_) => {
                        crate::metrics::record_resource_deleted(KIND_CHART);
                        Ok(())
                    }
                    Err(err) if is_kube_not_found(&err) => {
                        debug!("chart {:?} already deleted", name);
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(err) if is_api_unavailable(&err) => {
                debug!("target cluster is unavailable, canceling reconciliation");
                rctx.status.target_cluster.is_unavailable = true;
                rctx.cancel_chain();
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
#[path = "chart_tests.rs"]
mod chart_tests;
