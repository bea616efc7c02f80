// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of `App` CRs.
//!
//! One reconciliation drives the resource chain over a fresh
//! [`ReconcileCtx`]:
//!
//! ```text
//! catalog -> clients -> configmap -> secret -> chart -> status
//! ```
//!
//! The create/update sweep runs units in declared order; the delete sweep
//! runs the setup units first (they only populate the context) and then the
//! writing units in reverse, so the Chart disappears before the config it
//! references. A unit can cancel the remainder of the chain without raising
//! an error; the engine then stops the sweep and, on deletion, keeps the
//! finalizer for the next attempt.
//!
//! A paused or cordoned App runs only the observing units, so its status
//! stays fresh while nothing is written.

pub mod catalog;
pub mod chart;
pub mod clients;
pub mod configmap;
pub mod secret;
pub mod status;
pub mod types;

#[allow(clippy::wildcard_imports)]
use self::types::*;

use crate::reconcilers::finalizers;
use self::catalog::CatalogResource;
use self::chart::ChartResource;
use self::clients::ClientsResource;
use self::configmap::ConfigMapResource;
use self::secret::SecretResource;
use self::status::StatusResource;

/// Units resolving context state; they never write derived objects.
fn setup_units() -> Vec<Box<dyn AppResource>> {
    vec![Box::new(CatalogResource), Box::new(ClientsResource)]
}

/// Units owning derived objects, in create order.
fn crud_units(ctx: &Context) -> Vec<Box<dyn AppResource>> {
    vec![
        Box::new(Crud(ConfigMapResource::new(&ctx.settings))),
        Box::new(Crud(SecretResource::new(&ctx.settings))),
        Box::new(Crud(ChartResource::new(&ctx.settings))),
    ]
}

/// Reconcile one App: create/update sweep, or delete sweep when the App
/// carries a deletion timestamp.
///
/// # Errors
///
/// Returns the first unit error; chain cancellations are not errors.
pub async fn reconcile_app(ctx: &Context, app: &App) -> Result<()> {
    let mut rctx = ReconcileCtx::default();

    if key::is_deleted(app) {
        delete_app(ctx, &mut rctx, app).await
    } else {
        create_or_update_app(ctx, &mut rctx, app).await
    }
}

/// The create/update sweep.
async fn create_or_update_app(ctx: &Context, rctx: &mut ReconcileCtx, app: &App) -> Result<()> {
    let suspended = is_suspended(app);

    if suspended {
        info!(
            "app {:?} is paused or cordoned, only observing status",
            app.name_any()
        );
    } else {
        finalizers::ensure_finalizer(&ctx.client, app).await?;
    }

    let mut units = setup_units();
    units.extend(crud_units(ctx));
    units.push(Box::new(StatusResource::new(&ctx.settings)));

    run_sweep(ctx, rctx, app, units, suspended, Sweep::CreateUpdate).await
}

/// The delete sweep. The finalizer comes off only when every step finished
/// without error and without cancellation.
async fn delete_app(ctx: &Context, rctx: &mut ReconcileCtx, app: &App) -> Result<()> {
    info!("app {:?} is being deleted", app.name_any());

    let mut units = setup_units();
    let mut crud = crud_units(ctx);
    crud.reverse();
    units.extend(crud);
    units.push(Box::new(StatusResource::new(&ctx.settings)));

    run_sweep(ctx, rctx, app, units, false, Sweep::Delete).await?;

    if rctx.chain_canceled() {
        debug!(
            "delete sweep for app {:?} was canceled, keeping finalizer",
            app.name_any()
        );
        return Ok(());
    }

    finalizers::remove_finalizer(&ctx.client, app).await
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Sweep {
    CreateUpdate,
    Delete,
}

async fn run_sweep(
    ctx: &Context,
    rctx: &mut ReconcileCtx,
    app: &App,
    units: Vec<Box<dyn AppResource>>,
    suspended: bool,
    sweep: Sweep,
) -> Result<()> {
    for unit in units {
        if suspended && !unit.observes_while_suspended() {
            debug!("app is suspended, skipping resource {:?}", unit.name());
            continue;
        }

        let result = match sweep {
            Sweep::CreateUpdate => unit.ensure_created(ctx, rctx, app).await,
            Sweep::Delete => unit.ensure_deleted(ctx, rctx, app).await,
        };

        if let Err(err) = result {
            crate::metrics::record_error(crate::constants::KIND_APP, err.kind());
            warn!(
                "resource {:?} failed for app {:?}: {}",
                unit.name(),
                app.name_any(),
                err
            );
            return Err(err);
        }

        rctx.finish_resource();

        if rctx.chain_canceled() {
            debug!(
                "resource {:?} canceled the remaining chain for app {:?}",
                unit.name(),
                app.name_any()
            );
            crate::metrics::record_reconciliation_canceled(crate::constants::KIND_APP);
            break;
        }
    }

    Ok(())
}

/// Whether the create/update sweep is suspended for this App.
#[must_use]
pub fn is_suspended(app: &App) -> bool {
    key::is_paused(app) || key::is_app_cordoned(app)
}
