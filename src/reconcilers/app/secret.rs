// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generated secret unit.
//!
//! Same lifecycle as the config map unit, for the secret side of the merge:
//! `${app}-chart-secrets` in the chart namespace on the target cluster,
//! existing exactly when the merged secret payload is non-empty.

#[allow(clippy::wildcard_imports)]
use super::types::*;

use crate::settings::Settings;
use crate::values;

/// Chain unit owning the `${app}-chart-secrets` secret.
pub struct SecretResource {
    chart_namespace: String,
}

impl SecretResource {
    /// Build the unit from operator settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        SecretResource {
            chart_namespace: settings.chart_namespace.clone(),
        }
    }

    fn desired_secret(&self, app: &App, merged: Vec<u8>) -> Secret {
        let mut data = BTreeMap::new();
        data.insert(crate::constants::VALUES_KEY.to_string(), ByteString(merged));

        Secret {
            metadata: ObjectMeta {
                name: Some(key::chart_secret_name(app)),
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
            ..Secret::default()
        }
    }
}

#[async_trait]
impl ChainResource for SecretResource {
    type State = Secret;

    const NAME: &'static str = "secret";

    async fn current_state(
        &self,
        _ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<Option<Secret>> {
        let Some(target) = rctx.target.clone() else {
            return Ok(None);
        };

        let name = key::chart_secret_name(app);
        let api: Api<Secret> = Api::namespaced(target, &self.chart_namespace);

        match api.get(&name).await {
            Ok(secret) => Ok(Some(secret)),
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
    ) -> Result<Option<Secret>> {
        if key::is_deleted(app) {
            return Ok(Some(Secret {
                metadata: ObjectMeta {
                    name: Some(key::chart_secret_name(app)),
                    namespace: Some(self.chart_namespace.clone()),
                    ..ObjectMeta::default()
                },
                ..Secret::default()
            }));
        }

        let catalog = rctx
            .catalog
            .clone()
            .ok_or_else(|| Error::EmptyValue("catalog not resolved".to_string()))?;

        match values::merge_secret_data(&ctx.client, app, &catalog).await {
            Ok(Some(merged)) => {
                rctx.secret_desired = true;
                Ok(Some(self.desired_secret(app, merged)))
            }
            Ok(None) => {
                rctx.secret_desired = false;
                Ok(None)
            }
            Err(err) if err.is_not_found() => {
                warn!(
                    "dependent secrets for app {:?} are not found: {}",
                    app.name_any(),
                    err
                );
                rctx.record_chart_status(STATUS_SECRET_MERGE_FAILED, &err.to_string());
                rctx.cancel_resource();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn states_equal(&self, current: &Secret, desired: &Secret) -> bool {
        current.data == desired.data
            && current.metadata.labels == desired.metadata.labels
            && current.metadata.annotations == desired.metadata.annotations
    }

    fn is_empty(&self, state: &Secret) -> bool {
        state.data.as_ref().is_none_or(BTreeMap::is_empty)
    }

    fn new_update_change(
        &self,
        current: Option<&Secret>,
        desired: Option<&Secret>,
    ) -> Option<Change<Secret>> {
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
        change: Change<Secret>,
    ) -> Result<()> {
        let Some(target) = rctx.target.clone() else {
            return Ok(());
        };

        let api: Api<Secret> = Api::namespaced(target, &self.chart_namespace);

        let result = match &change {
            Change::Create(secret) => {
                let name = secret.metadata.name.as_deref().unwrap_or_default();
                info!(
                    "creating secret {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.create(&PostParams::default(), secret).await {
                    Ok(_) => {
                        crate::metrics::record_resource_created("Secret");
                        Ok(())
                    }
                    Err(kube::Error::Api(resp)) if resp.code == 409 => {
                        debug!("secret {:?} already created", name);
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Change::Update(secret) => {
                let name = secret.metadata.name.as_deref().unwrap_or_default();
                info!(
                    "updating secret {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.replace(name, &PostParams::default(), secret).await {
                    Ok(_) => {
                        crate::metrics::record_resource_updated("Secret");
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Change::Delete(secret) => {
                let name = secret.metadata.name.as_deref().unwrap_or_default();
                info!(
                    "deleting secret {:?} in namespace {:?} for app {:?}",
                    name,
                    self.chart_namespace,
                    app.name_any()
                );
                match api.delete(name, &DeleteParams::default()).await {
                    Ok(_) => {
                        crate::metrics::record_resource_deleted("Secret");
                        Ok(())
                    }
                    Err(err) if is_kube_not_found(&err) => {
                        debug!("secret {:?} already deleted", name);
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
#[path = "secret_tests.rs"]
mod secret_tests;
