// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Catalog resolution unit.
//!
//! Resolves the Catalog CR an App references and stores it on the
//! reconciliation context for the units downstream. Performs no writes.
//! When `spec.catalogNamespace` is empty the lookup tries `default` and then
//! `giantswarm`.

#[allow(clippy::wildcard_imports)]
use super::types::*;

use crate::constants::CATALOG_NAMESPACES;

/// Chain unit resolving `spec.catalog` into [`ReconcileCtx::catalog`].
pub struct CatalogResource;

#[async_trait]
impl AppResource for CatalogResource {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn ensure_created(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<()> {
        let catalog_name = key::catalog_name(app);

        debug!("looking for catalog {:?}", catalog_name);

        let namespaces: Vec<String> = match key::catalog_namespace(app) {
            Some(namespace) => vec![namespace.to_string()],
            None => CATALOG_NAMESPACES.iter().map(ToString::to_string).collect(),
        };

        for namespace in &namespaces {
            let api: Api<Catalog> = Api::namespaced(ctx.client.clone(), namespace);
            match api.get(catalog_name).await {
                Ok(catalog) => {
                    debug!(
                        "found catalog {:?} in namespace {:?}",
                        catalog_name, namespace
                    );
                    rctx.catalog = Some(catalog);
                    return Ok(());
                }
                Err(err) if is_kube_not_found(&err) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::NotFound(format!("catalog {catalog_name:?}")))
    }

    async fn ensure_deleted(
        &self,
        _ctx: &Context,
        _rctx: &mut ReconcileCtx,
        _app: &App,
    ) -> Result<()> {
        // Deleting derived objects only needs their names, not the catalog.
        Ok(())
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod catalog_tests;
