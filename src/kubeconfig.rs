// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target-cluster client factory.
//!
//! Apps either install onto the management cluster (`spec.kubeConfig.inCluster`)
//! or onto a remote cluster whose kubeconfig lives in a referenced secret
//! under the `kubeConfig` data key. Building a client from a kubeconfig is
//! not free, so constructed clients are cached per secret and reused until
//! the secret's resource version changes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use k8s_openapi::api::core::v1::Secret;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use tracing::debug;

use crate::constants::KUBECONFIG_KEY;
use crate::crd::App;
use crate::errors::{is_kube_not_found, Error, Result};
use crate::key;

/// A resolved target cluster connection.
pub struct TargetCluster {
    /// Client for the target cluster; the management client for in-cluster
    /// apps.
    pub client: Client,

    /// Whether the kubeconfig secret carries a deletion timestamp, meaning
    /// the cluster is being torn down.
    pub deleting: bool,
}

impl std::fmt::Debug for TargetCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetCluster")
            .field("deleting", &self.deleting)
            .finish_non_exhaustive()
    }
}

/// Builds and caches typed clients for target clusters.
pub struct TargetClientFactory {
    management: Client,
    timeout: Duration,
    // (secret namespace, secret name) -> (resource version, client)
    cache: Mutex<HashMap<(String, String), (String, Client)>>,
}

impl TargetClientFactory {
    /// Create a factory around the management client. `timeout` bounds every
    /// HTTP call made through clients the factory constructs.
    #[must_use]
    pub fn new(management: Client, timeout: Duration) -> Self {
        TargetClientFactory {
            management,
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The management cluster client.
    #[must_use]
    pub fn management(&self) -> Client {
        self.management.clone()
    }

    /// Resolve the target cluster for an App.
    ///
    /// In-cluster apps reuse the management client. Remote apps get a client
    /// built from the referenced kubeconfig secret, served from the cache
    /// when the secret's resource version is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyValue`] when the App references no secret,
    /// [`Error::NotFound`] when the secret or its `kubeConfig` key is absent,
    /// and [`Error::Kubeconfig`] when the bytes do not parse. Reachability of
    /// the resulting cluster is the caller's concern.
    pub async fn target_cluster(&self, app: &App) -> Result<TargetCluster> {
        if key::in_cluster(app) {
            return Ok(TargetCluster {
                client: self.management.clone(),
                deleting: false,
            });
        }

        let Some(secret_ref) = key::kube_config_secret(app) else {
            return Err(Error::EmptyValue(format!(
                "app {} has neither inCluster nor a kubeconfig secret",
                app.name_any()
            )));
        };

        let api: Api<Secret> = Api::namespaced(self.management.clone(), &secret_ref.namespace);
        let secret = match api.get(&secret_ref.name).await {
            Ok(secret) => secret,
            Err(err) if is_kube_not_found(&err) => {
                return Err(Error::NotFound(format!(
                    "kubeconfig secret {}/{}",
                    secret_ref.namespace, secret_ref.name
                )));
            }
            Err(err) => return Err(err.into()),
        };

        let deleting = secret.metadata.deletion_timestamp.is_some();
        let resource_version = secret.resource_version().unwrap_or_default();
        let cache_key = (secret_ref.namespace.clone(), secret_ref.name.clone());

        if let Some(client) = self.cached(&cache_key, &resource_version) {
            return Ok(TargetCluster { client, deleting });
        }

        let Some(raw) = secret.data.as_ref().and_then(|d| d.get(KUBECONFIG_KEY)) else {
            return Err(Error::NotFound(format!(
                "secret {}/{} does not have a {KUBECONFIG_KEY} key in its data",
                secret_ref.namespace, secret_ref.name
            )));
        };

        let text = std::str::from_utf8(&raw.0).map_err(|_| Error::WrongType {
            expected: "UTF-8 kubeconfig",
            got: format!(
                "binary data in secret {}/{}",
                secret_ref.namespace, secret_ref.name
            ),
        })?;

        let kubeconfig = Kubeconfig::from_yaml(text)?;
        let options = KubeConfigOptions {
            context: key::kube_config_context_name(app).map(str::to_string),
            ..KubeConfigOptions::default()
        };

        let mut config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;
        config.connect_timeout = Some(self.timeout);
        config.read_timeout = Some(self.timeout);

        let client = Client::try_from(config)?;

        debug!(
            secret = %secret_ref.name,
            namespace = %secret_ref.namespace,
            resource_version = %resource_version,
            "built target cluster client from kubeconfig secret"
        );

        self.store(cache_key, resource_version, client.clone());

        Ok(TargetCluster { client, deleting })
    }

    fn cached(&self, cache_key: &(String, String), resource_version: &str) -> Option<Client> {
        let mut cache = self.cache.lock().expect("client cache poisoned");
        match cache.get(cache_key) {
            Some((cached_version, client)) if cached_version == resource_version => {
                Some(client.clone())
            }
            Some(_) => {
                // Secret rotated underneath us, drop the stale client.
                cache.remove(cache_key);
                None
            }
            None => None,
        }
    }

    fn store(&self, cache_key: (String, String), resource_version: String, client: Client) {
        let mut cache = self.cache.lock().expect("client cache poisoned");
        cache.insert(cache_key, (resource_version, client));
    }
}

#[cfg(test)]
#[path = "kubeconfig_tests.rs"]
mod kubeconfig_tests;
