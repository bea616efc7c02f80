// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Layered merging of app configuration sources.
//!
//! Every App's effective configuration is assembled from up to four layers of
//! config maps and up to three layers of secrets, all read from the
//! management cluster. Layers are folded weakest-first with a deep merge;
//! the output is canonical YAML with sorted keys at every level, so equal
//! inputs always serialize to byte-identical bytes.
//!
//! Precedence, strongest wins:
//!
//! | Layer | Config map side | Secret side |
//! |---|---|---|
//! | strongest | user config map | user secret |
//! | | app-level config map | app-level secret |
//! | | `${namespace}-cluster-values` | — |
//! | weakest | catalog config map | catalog secret |
//!
//! A referenced source that does not exist is a [`Error::NotFound`]; the
//! calling unit downgrades that to a warning and skips the write. The
//! cluster-values config map is looked up by convention and its absence is
//! simply an empty layer.

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::constants::VALUES_KEY;
use crate::crd::{App, Catalog, NamespacedObjectRef};
use crate::errors::{is_kube_not_found, Error, Result};
use crate::key;

/// Merge all config-map layers for an App into canonical YAML.
///
/// Returns `Ok(None)` when no layer contributed any data, which the caller
/// treats as "no config map should exist". When at least one layer
/// contributed, the operator baseline (`{image: {registry: ...}}`) is merged
/// underneath as the weakest layer.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when a referenced source is absent, and
/// [`Error::WrongType`] when a source holds YAML that is not a mapping.
pub async fn merge_config_map_data(
    client: &Client,
    app: &App,
    catalog: &Catalog,
    image_registry: &str,
) -> Result<Option<String>> {
    let mut layers: Vec<Value> = Vec::new();

    if let Some(source) = key::catalog_config_map(catalog) {
        layers.extend(read_config_map_layer(client, source, true).await?);
    }

    let cluster_values = NamespacedObjectRef {
        name: key::cluster_values_config_map_name(app),
        namespace: kube::ResourceExt::namespace(app).unwrap_or_default(),
    };
    layers.extend(read_config_map_layer(client, &cluster_values, false).await?);

    if let Some(source) = key::app_config_map(app) {
        layers.extend(read_config_map_layer(client, source, true).await?);
    }

    if let Some(source) = key::user_config_map(app) {
        layers.extend(read_config_map_layer(client, source, true).await?);
    }

    if layers.iter().all(is_empty_tree) {
        return Ok(None);
    }

    let mut merged = baseline_values(image_registry);
    for layer in layers {
        merged = deep_merge(merged, layer);
    }

    Ok(Some(canonical_yaml(&merged)?))
}

/// Merge all secret layers for an App into canonical YAML bytes.
///
/// Returns `Ok(None)` when no layer contributed any data. The secret merge is
/// independent of the config-map merge and carries no baseline layer.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when a referenced secret is absent, and
/// [`Error::WrongType`] when a secret holds YAML that is not a mapping.
pub async fn merge_secret_data(
    client: &Client,
    app: &App,
    catalog: &Catalog,
) -> Result<Option<Vec<u8>>> {
    let mut layers: Vec<Value> = Vec::new();

    if let Some(source) = key::catalog_secret(catalog) {
        layers.extend(read_secret_layer(client, source).await?);
    }

    if let Some(source) = key::app_secret(app) {
        layers.extend(read_secret_layer(client, source).await?);
    }

    if let Some(source) = key::user_secret(app) {
        layers.extend(read_secret_layer(client, source).await?);
    }

    if layers.iter().all(is_empty_tree) {
        return Ok(None);
    }

    let mut merged = Value::Mapping(Mapping::new());
    for layer in layers {
        merged = deep_merge(merged, layer);
    }

    Ok(Some(canonical_yaml(&merged)?.into_bytes()))
}

/// Deep-merge two YAML trees, `overlay` winning on conflicts.
///
/// Mapping nodes merge key-by-key recursively; any other pairing (scalars,
/// sequences, mapping-vs-scalar) replaces the base wholesale, so the merge is
/// total for arbitrarily shaped inputs.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (k, v) in overlay_map {
                match base_map.remove(&k) {
                    Some(existing) => {
                        base_map.insert(k, deep_merge(existing, v));
                    }
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
            Value::Mapping(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Serialize a YAML tree with keys sorted at every level.
///
/// Sorting makes the output a fixed point: decoding and re-encoding the
/// result yields the same bytes.
///
/// # Errors
///
/// Returns [`Error::Yaml`] when serialization fails.
pub fn canonical_yaml(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(&canonicalize(value))?)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            entries.sort_by(|(a, _), (b, _)| key_string(a).cmp(&key_string(b)));
            Value::Mapping(entries.into_iter().collect())
        }
        Value::Sequence(seq) => Value::Sequence(seq.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

/// Operator-level baseline merged underneath every non-empty config merge.
fn baseline_values(image_registry: &str) -> Value {
    let mut image = Mapping::new();
    image.insert(
        Value::String("registry".to_string()),
        Value::String(image_registry.to_string()),
    );
    let mut root = Mapping::new();
    root.insert(Value::String("image".to_string()), Value::Mapping(image));
    Value::Mapping(root)
}

fn is_empty_tree(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}

/// Read one config-map layer. `required` distinguishes explicitly referenced
/// sources (absence is an error) from conventional ones (absence is empty).
async fn read_config_map_layer(
    client: &Client,
    source: &NamespacedObjectRef,
    required: bool,
) -> Result<Option<Value>> {
    let api: Api<ConfigMap> = Api::namespaced(client.clone(), &source.namespace);

    let config_map = match api.get(&source.name).await {
        Ok(cm) => cm,
        Err(err) if is_kube_not_found(&err) => {
            if required {
                return Err(Error::NotFound(format!(
                    "config map {}/{}",
                    source.namespace, source.name
                )));
            }
            debug!(
                name = %source.name,
                namespace = %source.namespace,
                "optional config map not found, treating as empty layer"
            );
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let Some(raw) = config_map.data.as_ref().and_then(|d| d.get(VALUES_KEY)) else {
        return Ok(None);
    };

    parse_tree(raw.as_bytes(), &source.name).map(Some)
}

/// Read one secret layer. Secret sources are always explicitly referenced,
/// so absence is an error.
async fn read_secret_layer(client: &Client, source: &NamespacedObjectRef) -> Result<Option<Value>> {
    let api: Api<Secret> = Api::namespaced(client.clone(), &source.namespace);

    let secret = match api.get(&source.name).await {
        Ok(secret) => secret,
        Err(err) if is_kube_not_found(&err) => {
            return Err(Error::NotFound(format!(
                "secret {}/{}",
                source.namespace, source.name
            )));
        }
        Err(err) => return Err(err.into()),
    };

    let Some(raw) = secret.data.as_ref().and_then(|d| d.get(VALUES_KEY)) else {
        return Ok(None);
    };

    parse_tree(&raw.0, &source.name).map(Some)
}

/// Decode one source document into a string-keyed tree.
fn parse_tree(raw: &[u8], source_name: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_slice(raw)?;
    match value {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(value),
        other => Err(Error::WrongType {
            expected: "YAML mapping",
            got: format!("{other:?} in source {source_name}"),
        }),
    }
}

#[cfg(test)]
#[path = "values_tests.rs"]
mod values_tests;
