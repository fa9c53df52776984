//! # Deferred Replication Initializer
//!
//! Streams a document snapshot into a replica without blocking the caller.
//!
//! ## Design
//!
//! - [`DeferredInitializer::start`] returns an [`InitHandle`] immediately
//! - A driver task waits out the settle delay, resets deck metadata, then
//!   drains the [`TaskQueue`] in small batches with a pause between them
//! - Every task runs in its own transaction; a failure is logged and counted,
//!   never fatal to the batch
//! - A monitor task polls shared progress and reports completion once every
//!   slide has been attempted and nothing is queued or in flight
//!
//! ## Example
//!
//! ```rust,ignore
//! let replica = Arc::new(YrsReplica::new());
//! let initializer = DeferredInitializer::new(replica.clone());
//!
//! let handle = initializer.start(snapshot);
//! // ... caller carries on ...
//! let report = handle.wait().await?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use deckhand_common::{DocumentSnapshot, ReplicationConfig};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::errors::ReplicationError;
use crate::queue::{ReplicationTask, TaskQueue};
use crate::replica::ReplicaBackend;

/// Final tally of an initialization run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub slides_created: usize,
    pub components_added: usize,
    pub failed_tasks: usize,
}

/// Live view of a run in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitProgress {
    pub slides_total: usize,

    /// Create-slide tasks attempted, successful or not
    pub slides_finished: usize,

    pub slides_created: usize,
    pub components_added: usize,
    pub failed_tasks: usize,
    pub queued: usize,
    pub in_flight: bool,

    /// Tasks have been enqueued
    pub seeded: bool,
}

impl InitProgress {
    pub fn is_complete(&self) -> bool {
        self.seeded
            && self.slides_finished >= self.slides_total
            && self.queued == 0
            && !self.in_flight
    }

    fn report(&self) -> InitReport {
        InitReport {
            slides_created: self.slides_created,
            components_added: self.components_added,
            failed_tasks: self.failed_tasks,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SharedProgress(Arc<Mutex<InitProgress>>);

impl SharedProgress {
    fn lock(&self) -> MutexGuard<'_, InitProgress> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot(&self) -> InitProgress {
        *self.lock()
    }
}

/// Caller's side of a running initialization. Dropping it does not cancel
/// the run.
#[derive(Debug)]
pub struct InitHandle {
    progress: SharedProgress,
    done: oneshot::Receiver<InitReport>,
}

impl InitHandle {
    pub fn progress(&self) -> InitProgress {
        self.progress.snapshot()
    }

    /// Wait for completion
    pub async fn wait(self) -> Result<InitReport, ReplicationError> {
        self.done.await.map_err(|_| ReplicationError::Interrupted)
    }
}

pub struct DeferredInitializer {
    backend: Arc<dyn ReplicaBackend>,
    config: ReplicationConfig,
}

impl DeferredInitializer {
    pub fn new(backend: Arc<dyn ReplicaBackend>) -> Self {
        Self::with_config(backend, ReplicationConfig::default())
    }

    pub fn with_config(backend: Arc<dyn ReplicaBackend>, config: ReplicationConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Begin replicating a snapshot. Must be called within a tokio runtime.
    pub fn start(&self, snapshot: DocumentSnapshot) -> InitHandle {
        let progress = SharedProgress::default();
        progress.lock().slides_total = snapshot.slides.len();

        tracing::info!(
            "[Replication] starting: {} slide(s), {} component(s)",
            snapshot.slides.len(),
            snapshot.total_components()
        );

        let driver = tokio::spawn(drive(
            self.backend.clone(),
            self.config.clone(),
            snapshot,
            progress.clone(),
        ));

        let (tx, rx) = oneshot::channel();
        tokio::spawn(monitor(
            driver,
            progress.clone(),
            self.config.clone(),
            tx,
        ));

        InitHandle { progress, done: rx }
    }
}

async fn drive(
    backend: Arc<dyn ReplicaBackend>,
    config: ReplicationConfig,
    snapshot: DocumentSnapshot,
    progress: SharedProgress,
) {
    tokio::time::sleep(config.settle_delay()).await;

    if let Err(e) = backend.reset_deck(&snapshot.deck) {
        tracing::warn!("[Replication] deck metadata failed: {}", e);
        progress.lock().failed_tasks += 1;
    }

    let mut queue = TaskQueue::from_slides(snapshot.slides, &config);
    {
        let mut state = progress.lock();
        state.queued = queue.len();
        state.seeded = true;
    }
    tracing::debug!("[Replication] queued {} task(s)", queue.len());

    loop {
        let batch = queue.next_batch(config.batch_size);
        if batch.is_empty() {
            break;
        }
        {
            let mut state = progress.lock();
            state.in_flight = true;
            state.queued = queue.len();
        }

        for task in batch {
            run_task(backend.as_ref(), task, &progress);
        }
        progress.lock().in_flight = false;

        if !queue.is_empty() {
            tokio::time::sleep(config.batch_delay()).await;
        }
    }
}

fn run_task(backend: &dyn ReplicaBackend, task: ReplicationTask, progress: &SharedProgress) {
    match task {
        ReplicationTask::CreateSlide(slide) => {
            let result = backend.create_slide(&slide);
            let mut state = progress.lock();
            state.slides_finished += 1;
            match result {
                Ok(()) => state.slides_created += 1,
                Err(e) => {
                    tracing::warn!("[Replication] slide {} failed: {}", slide.id, e);
                    state.failed_tasks += 1;
                }
            }
        }
        ReplicationTask::AppendComponent {
            slide_id,
            component,
        } => {
            let result = backend.append_component(&slide_id, &component);
            let mut state = progress.lock();
            match result {
                Ok(()) => state.components_added += 1,
                Err(e) => {
                    tracing::warn!(
                        "[Replication] component {} on slide {} failed: {}",
                        component.id,
                        slide_id,
                        e
                    );
                    state.failed_tasks += 1;
                }
            }
        }
    }
}

async fn monitor(
    driver: JoinHandle<()>,
    progress: SharedProgress,
    config: ReplicationConfig,
    done: oneshot::Sender<InitReport>,
) {
    loop {
        tokio::time::sleep(config.poll_interval()).await;

        let state = progress.snapshot();
        if state.is_complete() {
            let report = state.report();
            tracing::info!(
                "[Replication] complete: {} slide(s), {} component(s), {} failure(s)",
                report.slides_created,
                report.components_added,
                report.failed_tasks
            );
            // Receiver may be gone; the run still counts as finished
            let _ = done.send(report);
            return;
        }

        if driver.is_finished() {
            // Driver ended without completing (it panicked); dropping `done`
            // wakes the waiter with an error
            tracing::error!("[Replication] driver stopped before completion");
            return;
        }
    }
}
