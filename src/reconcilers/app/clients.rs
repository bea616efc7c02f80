// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target cluster client switching unit.
//!
//! Resolves the cluster an App installs onto and stores the client on the
//! reconciliation context. Three failure modes are distinguished: a missing
//! kubeconfig secret surfaces as a hard error, a cluster being torn down and
//! an unreachable cluster both cancel the chain without error so normal
//! resync acts as the retry timer.

#[allow(clippy::wildcard_imports)]
use super::types::*;

/// Chain unit resolving the target cluster into [`ReconcileCtx::target`].
pub struct ClientsResource;

impl ClientsResource {
    async fn switch(&self, ctx: &Context, rctx: &mut ReconcileCtx, app: &App) -> Result<()> {
        let target = ctx.clients.target_cluster(app).await?;

        if target.deleting {
            debug!(
                "target cluster of app {:?} is being deleted, canceling reconciliation",
                app.name_any()
            );
            rctx.status.target_cluster.is_deleting = true;
            rctx.cancel_chain();
            return Ok(());
        }

        // Remote clusters get probed so a dead cluster skips the sweep
        // instead of failing every write.
        if !key::in_cluster(app) {
            if let Err(err) = target.client.apiserver_version().await {
                if is_api_unavailable(&err) {
                    debug!(
                        "target cluster of app {:?} is unavailable, canceling reconciliation",
                        app.name_any()
                    );
                    rctx.status.target_cluster.is_unavailable = true;
                    rctx.cancel_chain();
                    return Ok(());
                }
                return Err(err.into());
            }
        }

        rctx.target = Some(target.client);
        Ok(())
    }
}

#[async_trait]
impl AppResource for ClientsResource {
    fn name(&self) -> &'static str {
        "clients"
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
        self.switch(ctx, rctx, app).await
    }

    async fn ensure_deleted(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<()> {
        match self.switch(ctx, rctx, app).await {
            Err(err) if err.is_not_found() => {
                // The kubeconfig secret is gone, so the target cluster was
                // deleted and took the derived objects with it. Leave the
                // target unset; downstream delete steps become no-ops.
                warn!(
                    "kubeconfig secret of app {:?} is gone, assuming target cluster was deleted: {}",
                    app.name_any(),
                    err
                );
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "clients_tests.rs"]
mod clients_tests;
