//! Convergence loop: the [`Reconciler`] contract, the single-pass driver and
//! the [`Controller`] that feeds it from store events.

mod action;
mod controller;
mod queue;

pub use action::Action;
pub use controller::Controller;
pub use queue::KeyedQueue;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use cloudctl_core::events::ResourceEvent;
use cloudctl_core::{
    Condition, ConditionStatus, HasStatus, ObjectKey, READY, Resource, StatusConditions,
};
use cloudctl_store::StoreError;

use crate::context::Context;
use crate::error::{ReconcileError, TERMINAL_REASONS, reason};

/// One controller's reconcile logic for objects of one kind.
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    type Object: HasStatus;

    fn name(&self) -> &'static str;

    /// Converges the world onto `object`'s spec. Must be safe to run any
    /// number of times on the same input.
    async fn reconcile(
        &self,
        object: Arc<Self::Object>,
        ctx: &Context,
    ) -> Result<Action, ReconcileError>;

    /// Keys of this controller's kind affected by an event on another kind
    /// that does not own them.
    async fn related(
        &self,
        _event: &ResourceEvent,
        _ctx: &Context,
    ) -> Result<Vec<ObjectKey>, ReconcileError> {
        Ok(Vec::new())
    }
}

/// Runs one pass for `key` and turns any error into a `Ready=False`
/// condition plus a follow-up action.
pub async fn run_once<R: Reconciler>(reconciler: &R, ctx: &Context, key: &ObjectKey) -> Action {
    let api = ctx.api::<R::Object>();
    let object = match api.get(&key.namespace, &key.name).await {
        Ok(Some(object)) => object,
        Ok(None) => {
            debug!(controller = reconciler.name(), key = %key, "object gone");
            return Action::await_change();
        }
        Err(err) if !err.is_retryable() => {
            info!(
                controller = reconciler.name(),
                key = %key,
                error = %err,
                "object does not decode"
            );
            if let Err(write_err) = record_undecodable(ctx, key, &err).await {
                warn!(
                    controller = reconciler.name(),
                    key = %key,
                    error = %write_err,
                    "failed to record failure condition"
                );
            }
            return Action::await_change();
        }
        Err(err) => {
            warn!(controller = reconciler.name(), key = %key, error = %err, "read failed");
            return Action::requeue(ctx.config.error_requeue_delay);
        }
    };

    if !object.meta().is_deleting() && failed_terminally(&object) {
        debug!(
            controller = reconciler.name(),
            key = %key,
            generation = object.meta().generation(),
            "skipping generation that failed terminally"
        );
        return Action::await_change();
    }

    match reconciler.reconcile(Arc::new(object), ctx).await {
        Ok(action) => {
            debug!(controller = reconciler.name(), key = %key, ?action, "reconciled");
            action
        }
        Err(err) => error_policy::<R::Object>(reconciler.name(), ctx, key, &err).await,
    }
}

/// Whether the current generation already ended in a terminal failure.
pub fn failed_terminally<K: HasStatus>(object: &K) -> bool {
    object
        .status()
        .and_then(|status| status.condition(READY))
        .is_some_and(|ready| {
            ready.status == ConditionStatus::False
                && TERMINAL_REASONS.contains(&ready.reason.as_str())
                && ready.observed_generation == Some(object.meta().generation())
        })
}

async fn error_policy<K: HasStatus>(
    controller: &'static str,
    ctx: &Context,
    key: &ObjectKey,
    err: &ReconcileError,
) -> Action {
    let retryable = err.is_retryable();
    if retryable {
        warn!(
            controller = controller,
            key = %key,
            category = %err.category(),
            error = %err,
            "reconcile failed"
        );
    } else {
        info!(
            controller = controller,
            key = %key,
            category = %err.category(),
            error = %err,
            "reconcile failed terminally"
        );
    }

    if let Err(write_err) = record_failure::<K>(ctx, key, err).await {
        warn!(
            controller = controller,
            key = %key,
            error = %write_err,
            "failed to record failure condition"
        );
    }

    if retryable {
        Action::requeue(ctx.config.error_requeue_delay)
    } else {
        Action::await_change()
    }
}

async fn record_failure<K: HasStatus>(
    ctx: &Context,
    key: &ObjectKey,
    err: &ReconcileError,
) -> Result<(), ReconcileError> {
    let api = ctx.api::<K>();
    let Some(mut latest) = api.get(&key.namespace, &key.name).await? else {
        return Ok(());
    };
    let generation = latest.meta().generation();
    let message = err.to_string();

    let unchanged = latest
        .status()
        .and_then(|status| status.condition(READY))
        .is_some_and(|ready| {
            ready.status == ConditionStatus::False
                && ready.reason == err.reason()
                && ready.message == message
                && ready.observed_generation == Some(generation)
        });
    if unchanged {
        return Ok(());
    }

    latest.status_mut().set_condition(Condition::not_ready(
        err.reason(),
        message,
        ctx.now(),
        generation,
    ));
    api.replace_status(&latest).await?;
    Ok(())
}

/// Writes `Ready=False` onto an object that cannot be decoded, editing the
/// raw status so fields that still parse are kept.
async fn record_undecodable(
    ctx: &Context,
    key: &ObjectKey,
    err: &StoreError,
) -> Result<(), StoreError> {
    let Some(stored) = ctx.store.get(key).await? else {
        return Ok(());
    };
    let generation = stored
        .object
        .pointer("/metadata/generation")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let mut status = match stored.object.get("status") {
        Some(Value::Object(status)) => status.clone(),
        _ => Map::new(),
    };
    let mut conditions = RawConditions(
        status
            .get("conditions")
            .cloned()
            .and_then(|c| serde_json::from_value(c).ok())
            .unwrap_or_default(),
    );

    let message = err.to_string();
    let unchanged = conditions.condition(READY).is_some_and(|ready| {
        ready.status == ConditionStatus::False
            && ready.reason == reason::INVALID_SPEC
            && ready.message == message
            && ready.observed_generation == Some(generation)
    });
    if unchanged {
        return Ok(());
    }

    conditions.set_condition(Condition::not_ready(
        reason::INVALID_SPEC,
        message,
        ctx.now(),
        generation,
    ));
    status.insert("conditions".to_string(), serde_json::to_value(conditions.0)?);
    ctx.store.update_status(key, &Value::Object(status)).await?;
    Ok(())
}

struct RawConditions(Vec<Condition>);

impl StatusConditions for RawConditions {
    fn conditions(&self) -> &[Condition] {
        &self.0
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.0
    }
}
