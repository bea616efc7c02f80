// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generated config map unit.
//!
//! Materializes the merged chart values as `${app}-chart-values` in the
//! chart namespace on the target cluster. The config map exists exactly when
//! the merged payload is non-empty; deleting the App or emptying the payload
//! removes it.

#[allow(clippy::wildcard_imports)]
use super::types::*;

use crate::settings::Settings;
use crate::values;

/// Chain unit owning the `${app}-chart-values` config map.
pub struct ConfigMapResource {
    chart_namespace: String,
    image_registry: String,
}

impl ConfigMapResource {
    /// Build the unit from operator settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        ConfigMapResource {
            chart_namespace: settings.chart_namespace.clone(),
            image_registry: settings.image_registry.clone(),
        }
    }

    fn desired_config_map(&self, app: &App, merged_yaml: String) -> ConfigMap {
        let mut data = BTreeMap::new();
        data.insert(crate::constants::VALUES_KEY.to_string(), merged_yaml);

        ConfigMap {
            metadata: ObjectMeta {
                name: Some(key::chart_config_map_name(app)),
                namespace: Some(self.chart_namespace.clone()),
                labels: Some(BTreeMap::from([(
                    MANAGED_BY_LABEL.to_string(),
                    PROJECT_NAME.to_string(),
                )])),
                annotations: Some(BTreeMap::from([(
                    NOTES_ANNOTATION.to_string(),
                    NOTES_DO_NOT_EDIT.to_string(),
                )])),
                ..ObjectMeta::default()
            },
            data: Some(data),
            ..ConfigMap::default()
        }
    }
}

#[async_trait]
impl ChainResource for ConfigMapResource {
    type State = ConfigMap;

    const NAME: &'static str = "configmap";

    async fn current_state(
        &self,
        _ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<Option<ConfigMap>> {
        let Some(target) = rctx.target.clone() else {
            return Ok(None);
        };

        let name = key::chart_config_map_name(app);
        let api: Api<ConfigMap> = Api::namespaced(target, &self.chart_namespace);

        match api.get(&name).await {
            Ok(config_map) => Ok(Some(config_map)),
            Err(err) if is_kube_not_found(&err) => Ok(None),
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
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<Option<ConfigMap>> {
        if key::is_deleted(app) {
            // Bare shell so the delete diff targets the right object.
            return Ok(Some(ConfigMap {
                metadata: ObjectMeta {
                    name: Some(key::chart_config_map_name(app)),
                    namespace: Some(self.chart_namespace.clone()),
                    ..ObjectMeta::default()
                },
                ..ConfigMap::default()
            }));
        }

        let catalog = rctx
            .catalog
            .clone()
            .ok_or_else(|| Error::EmptyValue("catalog not resolved".to_string()))?;

        match values::merge_config_map_data(&ctx.client, app, &catalog, &self.image_registry).await
        {
            Ok(Some(merged_yaml)) => {
                rctx.config_map_desired = true;
                Ok(Some(self.desired_config_map(app, merged_yaml)))
            }
            Ok(None) => {
                rctx.config_map_desired = false;
                Ok(None)
            }
            Err(err) if err.is_not_found() => {
                warn!(
                    "dependent config maps for app {:?} are not found: {}",
                    app.name_any(),
                    err
                );
                rctx.record_chart_status(STATUS_CONFIGMAP_MERGE_FAILED, &err.to_string());
                rctx.cancel_resource();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn states_equal(&self, current: &ConfigMap, desired: &ConfigMap) -> bool {
        current.data == desired.data
            && current.metadata.labels == desired.metadata.labels
            && current.metadata.annotations == desired.metadata.annotations
    }

    fn is_empty(&self, state: &ConfigMap) -> bool {
        state.data.as_ref().is_none_or(BTreeMap::is_empty)
    }

    fn new_update_change(
        &self,
        current: Option<&ConfigMap>,
        desired: Option<&ConfigMap>,
    ) -> Option<Change<ConfigMap>> {
        match (current, desired) {
            (Some(current), Some(desired)) if !self.states_equal(current, desired) => {
                // Replace needs the live resource version.
                let mut desired = desired.clone();
                desired.metadata.resource_version = current.metadata.resource_version.clone();
                Some(Change::Update(desired))
            }
            (Some(current), None) => Some(Change::Delete(current.clone())),
            _ => None,
        }
    }

    async fn apply_change(
        &self,
        _ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
        change: Change<ConfigMap>,
    ) -> Result<()> {
        let Some(target) = rctx.target.clone() else {
            return Ok(());
        };

        let api: Api<ConfigMap> = Api::namespaced(target, &self.chart_namespace);

        let result = match &change {
            Change::Create(config_map) => {
                let name = config_map.metadata.name.as_deref().unwrap_or_default();
                info!(
                    "creating config map {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.create(&PostParams::default(), config_map).await {
                    Ok(_) => {
                        crate::metrics::record_resource_created("ConfigMap");
                        Ok(())
                    }
                    Err(kube::Error::Api(resp)) if resp.code == 409 => {
                        debug!("config map {:?} already created", name);
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Change::Update(config_map) => {
                let name = config_map.metadata.name.as_deref().unwrap_or_default();
                info!(
                    "updating config map {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.replace(name, &PostParams::default(), config_map).await {
                    Ok(_) => {
                        crate::metrics::record_resource_updated("ConfigMap");
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Change::Delete(config_map) => {
                let name = config_map.metadata.name.as_deref().unwrap_or_default();
                info!(
                    "deleting config map {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.delete(name, &DeleteParams::default()).await {
                    Ok(_) => {
                        crate::metrics::record_resource_deleted("ConfigMap");
                        Ok(())
                    }
                    Err(err) if is_kube_not_found(&err) => {
                        debug!("config map {:?} already deleted", name);
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
#[path = "configmap_tests.rs"]
mod configmap_tests;
