//! Best-effort background persistence of goal and loop snapshots.
//!
//! In-memory state is authoritative. Services enqueue whole-record snapshots
//! after each mutation and return immediately; a single writer task drains
//! the queue in order, so snapshots of the same record are never written out
//! of order. A failed write is logged and parked in a pending map keyed by
//! record id (a newer snapshot replaces an older one); parked snapshots are
//! retried after the next successful write and on every flush.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{FeedbackLoop, Goal};
use crate::domain::ports::{GoalRepository, LoopRepository};

#[derive(Debug, Clone)]
enum Snapshot {
    Goal(Goal),
    Loop(FeedbackLoop),
}

impl Snapshot {
    fn key(&self) -> (SnapshotKind, Uuid) {
        match self {
            Self::Goal(goal) => (SnapshotKind::Goal, goal.id),
            Self::Loop(feedback_loop) => (SnapshotKind::Loop, feedback_loop.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SnapshotKind {
    Goal,
    Loop,
}

enum Command {
    Write(Snapshot),
    Flush(oneshot::Sender<usize>),
}

/// Handle to the background writer task. Cheap to clone.
#[derive(Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<Command>,
}

impl SnapshotWriter {
    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn(goals: Arc<dyn GoalRepository>, loops: Arc<dyn LoopRepository>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(goals, loops, rx));
        Self { tx }
    }

    /// Queue a goal snapshot.
    pub fn save_goal(&self, goal: &Goal) {
        self.send(Command::Write(Snapshot::Goal(goal.clone())));
    }

    /// Queue a loop snapshot.
    pub fn save_loop(&self, feedback_loop: &FeedbackLoop) {
        self.send(Command::Write(Snapshot::Loop(feedback_loop.clone())));
    }

    /// Wait until every snapshot queued so far has been attempted.
    ///
    /// Returns the number of snapshots still parked after failed writes.
    pub async fn flush(&self) -> usize {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_err() {
            return 0;
        }
        done_rx.await.unwrap_or(0)
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("snapshot writer has stopped; snapshot dropped");
        }
    }
}

async fn run(
    goals: Arc<dyn GoalRepository>,
    loops: Arc<dyn LoopRepository>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: HashMap<(SnapshotKind, Uuid), Snapshot> = HashMap::new();

    while let Some(command) = rx.recv().await {
        match command {
            Command::Write(snapshot) => {
                let key = snapshot.key();
                if write(goals.as_ref(), loops.as_ref(), &snapshot).await {
                    pending.remove(&key);
                    retry_pending(goals.as_ref(), loops.as_ref(), &mut pending).await;
                } else {
                    pending.insert(key, snapshot);
                }
            }
            Command::Flush(done) => {
                retry_pending(goals.as_ref(), loops.as_ref(), &mut pending).await;
                let _ = done.send(pending.len());
            }
        }
    }

    if !pending.is_empty() {
        warn!(parked = pending.len(), "snapshot writer shutting down with unwritten snapshots");
    }
}

async fn retry_pending(
    goals: &dyn GoalRepository,
    loops: &dyn LoopRepository,
    pending: &mut HashMap<(SnapshotKind, Uuid), Snapshot>,
) {
    if pending.is_empty() {
        return;
    }
    let keys: Vec<_> = pending.keys().copied().collect();
    for key in keys {
        let Some(snapshot) = pending.get(&key) else {
            continue;
        };
        if write(goals, loops, snapshot).await {
            debug!(id = %key.1, "parked snapshot written on retry");
            pending.remove(&key);
        }
    }
}

async fn write(goals: &dyn GoalRepository, loops: &dyn LoopRepository, snapshot: &Snapshot) -> bool {
    let result = match snapshot {
        Snapshot::Goal(goal) => goals.save(goal).await,
        Snapshot::Loop(feedback_loop) => loops.save(feedback_loop).await,
    };
    match result {
        Ok(()) => true,
        Err(err) => {
            let (kind, id) = snapshot.key();
            warn!(?kind, %id, error = %err, "failed to persist snapshot; will retry");
            false
        }
    }
}
