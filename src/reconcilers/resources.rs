// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The uniform resource-chain contract.
//!
//! Every unit in the reconciliation chain has the same shape: observe the
//! current state, compute the desired state, diff the two into a tagged
//! [`Change`], and apply it. [`ChainResource`] captures that shape with pure
//! default diff implementations, so concrete units only write observation,
//! desire and application code.
//!
//! The engine drives units through the object-safe [`AppResource`] trait;
//! the [`Crud`] adapter turns any [`ChainResource`] into an [`AppResource`]
//! by sequencing the triplets and honoring cancellation between steps. Units
//! without current/desired semantics (catalog resolution, client switching,
//! status observation) implement [`AppResource`] directly.

use async_trait::async_trait;

use crate::context::{Context, ReconcileCtx};
use crate::crd::App;
use crate::errors::Result;

/// A tagged state transition produced by diffing current against desired.
///
/// Keeping the payload inside the tag makes patch diffing total: every
/// combination of present/absent states maps to exactly one change or to
/// no-op.
#[derive(Clone, Debug, PartialEq)]
pub enum Change<S> {
    /// The object is absent and should exist.
    Create(S),
    /// The object exists but differs from the desired state.
    Update(S),
    /// The object exists and should not.
    Delete(S),
}

/// A chain unit with full current/desired/diff/apply semantics.
#[async_trait]
pub trait ChainResource: Send + Sync {
    /// Observed and desired state of this unit, usually a Kubernetes object.
    type State: Clone + Send + Sync;

    /// Identifier used in logs and metrics.
    const NAME: &'static str;

    /// Observe the state of the world. `None` means the object is absent.
    ///
    /// A unit may set cancellation flags on `rctx` instead of returning an
    /// error when the target cluster is unreachable.
    async fn current_state(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<Option<Self::State>>;

    /// Compute what the world should contain. `None` means the object should
    /// not exist.
    async fn desired_state(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<Option<Self::State>>;

    /// Whether two states are equal for update purposes.
    fn states_equal(&self, current: &Self::State, desired: &Self::State) -> bool;

    /// Whether a state is an empty shell not worth creating. Defaults to
    /// never-empty.
    fn is_empty(&self, _state: &Self::State) -> bool {
        false
    }

    /// Pure diff: create when nothing exists and the desired state is
    /// non-empty.
    fn new_create_change(
        &self,
        current: Option<&Self::State>,
        desired: Option<&Self::State>,
    ) -> Option<Change<Self::State>> {
        match (current, desired) {
            (None, Some(desired)) if !self.is_empty(desired) => {
                Some(Change::Create(desired.clone()))
            }
            _ => None,
        }
    }

    /// Pure diff: update when both exist and differ; delete when the object
    /// exists but the desired state vanished (e.g. a merge result became
    /// empty).
    fn new_update_change(
        &self,
        current: Option<&Self::State>,
        desired: Option<&Self::State>,
    ) -> Option<Change<Self::State>> {
        match (current, desired) {
            (Some(current), Some(desired)) if !self.states_equal(current, desired) => {
                Some(Change::Update(desired.clone()))
            }
            (Some(current), None) => Some(Change::Delete(current.clone())),
            _ => None,
        }
    }

    /// Pure diff for the delete sweep: remove whatever currently exists.
    fn new_delete_change(
        &self,
        current: Option<&Self::State>,
        _desired: Option<&Self::State>,
    ) -> Option<Change<Self::State>> {
        current.map(|current| Change::Delete(current.clone()))
    }

    /// Apply one change to the world.
    async fn apply_change(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
        change: Change<Self::State>,
    ) -> Result<()>;
}

/// Object-safe view of a chain unit, as driven by the engine.
#[async_trait]
pub trait AppResource: Send + Sync {
    /// Identifier used in logs and metrics.
    fn name(&self) -> &'static str;

    /// One step of the create/update sweep.
    async fn ensure_created(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<()>;

    /// One step of the delete sweep.
    async fn ensure_deleted(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<()>;

    /// Whether this unit still runs while the App is paused or cordoned.
    /// Only observing units return true.
    fn observes_while_suspended(&self) -> bool {
        false
    }
}

/// Adapter driving a [`ChainResource`] through the engine's sweeps.
///
/// The create/update sweep sequences current, desired, create-patch, apply,
/// update-patch, apply; the delete sweep produces only a delete patch.
/// Cancellation flags are honored between every step.
pub struct Crud<T>(pub T);

#[async_trait]
impl<T: ChainResource> AppResource for Crud<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    async fn ensure_created(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<()> {
        let unit = &self.0;

        let current = unit.current_state(ctx, rctx, app).await?;
        if rctx.canceled() {
            return Ok(());
        }

        let desired = unit.desired_state(ctx, rctx, app).await?;
        if rctx.canceled() {
            return Ok(());
        }

        if let Some(change) = unit.new_create_change(current.as_ref(), desired.as_ref()) {
            unit.apply_change(ctx, rctx, app, change).await?;
            if rctx.canceled() {
                return Ok(());
            }
        }

        if let Some(change) = unit.new_update_change(current.as_ref(), desired.as_ref()) {
            unit.apply_change(ctx, rctx, app, change).await?;
        }

        Ok(())
    }

    async fn ensure_deleted(
        &self,
        ctx: &Context,
        rctx: &mut ReconcileCtx,
        app: &App,
    ) -> Result<()> {
        let unit = &self.0;

        let current = unit.current_state(ctx, rctx, app).await?;
        if rctx.canceled() {
            return Ok(());
        }

        let desired = unit.desired_state(ctx, rctx, app).await?;
        if rctx.canceled() {
            return Ok(());
        }

        if let Some(change) = unit.new_delete_change(current.as_ref(), desired.as_ref()) {
            unit.apply_change(ctx, rctx, app, change).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
