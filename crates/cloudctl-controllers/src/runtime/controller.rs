use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use cloudctl_core::events::{ResourceEvent, ResourceEventType};
use cloudctl_core::{ObjectKey, Resource};

use super::{Action, KeyedQueue, Reconciler, run_once};
use crate::context::Context;

struct Inner<R> {
    reconciler: R,
    ctx: Arc<Context>,
    queue: KeyedQueue,
    /// Pending requeue timer per key. A newer pass replaces the older timer.
    requeues: DashMap<ObjectKey, CancellationToken>,
}

/// Drives a [`Reconciler`] from store events.
///
/// Events are mapped to keys of the controller's kind and pushed through a
/// [`KeyedQueue`], so passes for different keys run concurrently (up to
/// `max_concurrent_reconciles`) while each key has at most one pass running.
pub struct Controller<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for Controller<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Reconciler> Controller<R> {
    pub fn new(reconciler: R, ctx: Arc<Context>) -> Self {
        Self {
            inner: Arc::new(Inner {
                reconciler,
                ctx,
                queue: KeyedQueue::new(),
                requeues: DashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.reconciler.name()
    }

    pub fn queue(&self) -> &KeyedQueue {
        &self.inner.queue
    }

    /// Keys that need a pass because of `event`.
    ///
    /// Status-only changes to this controller's own kind are ignored; they are
    /// this controller's own writes.
    pub async fn keys_for(&self, event: &ResourceEvent) -> Vec<ObjectKey> {
        let kind = R::Object::KIND;
        let mut keys = Vec::new();

        if event.key.kind == kind {
            if event.event_type != ResourceEventType::StatusUpdated {
                keys.push(event.key.clone());
            }
        } else if let Some(owner) = event.controller_key().filter(|owner| owner.kind == kind) {
            keys.push(owner);
        }

        match self.inner.reconciler.related(event, &self.inner.ctx).await {
            Ok(related) => keys.extend(related),
            Err(err) => {
                warn!(
                    controller = self.name(),
                    event = %event.key,
                    error = %err,
                    "mapping related keys failed"
                );
            }
        }

        keys.sort();
        keys.dedup();
        keys
    }

    /// Queues every object of this controller's kind.
    pub async fn resync(&self) {
        let api = self.inner.ctx.api::<R::Object>();
        match api.list(None).await {
            Ok(objects) => {
                debug!(controller = self.name(), count = objects.len(), "resync");
                for object in objects {
                    self.inner.queue.enqueue(object.key());
                }
            }
            Err(err) => {
                warn!(controller = self.name(), error = %err, "resync failed");
            }
        }
    }

    /// Runs until `shutdown` fires or the event channel closes, then waits for
    /// in-flight passes to finish.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<ResourceEvent>,
        shutdown: CancellationToken,
    ) {
        let workers = self.inner.ctx.config.max_concurrent_reconciles.max(1);
        info!(controller = self.name(), workers, "starting controller");

        let tracker = TaskTracker::new();
        let permits = Arc::new(Semaphore::new(workers));
        let timers = shutdown.child_token();

        self.resync().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => {
                        for key in self.keys_for(&event).await {
                            self.inner.queue.enqueue(key);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(controller = self.name(), missed, "event stream lagged, resyncing");
                        self.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(controller = self.name(), "event channel closed");
                        break;
                    }
                },
                Some(key) = self.inner.queue.next() => {
                    self.spawn_pass(&tracker, &permits, &timers, key);
                }
            }
        }

        timers.cancel();
        tracker.close();
        tracker.wait().await;
        info!(controller = self.name(), "controller stopped");
    }

    fn spawn_pass(
        &self,
        tracker: &TaskTracker,
        permits: &Arc<Semaphore>,
        timers: &CancellationToken,
        key: ObjectKey,
    ) {
        let controller = self.clone();
        let permits = permits.clone();
        let tracker_handle = tracker.clone();
        let timers = timers.clone();

        tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                controller.inner.queue.done(&key);
                return;
            };
            let inner = &controller.inner;
            let action = run_once(&inner.reconciler, &inner.ctx, &key).await;
            controller.schedule(&tracker_handle, &timers, key.clone(), action);
            inner.queue.done(&key);
        });
    }

    fn schedule(
        &self,
        tracker: &TaskTracker,
        timers: &CancellationToken,
        key: ObjectKey,
        action: Action,
    ) {
        if let Some((_, previous)) = self.inner.requeues.remove(&key) {
            previous.cancel();
        }
        let Some(delay) = action.requeue_after() else {
            return;
        };
        if timers.is_cancelled() {
            return;
        }

        let token = timers.child_token();
        self.inner.requeues.insert(key.clone(), token.clone());
        let controller = self.clone();
        tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    debug!(controller = controller.name(), key = %key, "requeue timer fired");
                    controller.inner.queue.enqueue(key);
                }
            }
        });
    }
}

impl<R> std::fmt::Debug for Controller<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("pending_requeues", &self.inner.requeues.len())
            .finish_non_exhaustive()
    }
}
