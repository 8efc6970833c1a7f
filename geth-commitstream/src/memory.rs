use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::CommitStoreError;
use crate::store::CommitStore;
use crate::types::{Commit, CommitAttempt, Snapshot};

#[derive(Default)]
struct StreamState {
    commits: Vec<Commit>,
    snapshot: Option<Snapshot>,
}

type StreamKey = (String, String);

/// Reference `CommitStore` implementation. Defines the semantics other
/// backends are conformance-tested against: per stream, an ordered list
/// of commits guarded by its own lock, so sessions on unrelated streams
/// never block each other. `commit` verifies `commit_sequence ==
/// commits.len() + 1` (else `Concurrency`) and that `commit_id` is not
/// already present (else `DuplicateCommit`), then assigns a process-wide
/// monotonically increasing `checkpoint_token`.
#[derive(Default)]
pub struct InMemoryCommitStore {
    streams: Mutex<HashMap<StreamKey, Arc<Mutex<StreamState>>>>,
    next_checkpoint: AtomicU64,
}

impl InMemoryCommitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_checkpoint_token(&self) -> u64 {
        self.next_checkpoint.fetch_add(1, Ordering::SeqCst)
    }

    /// Looks up the per-stream lock, creating it if absent. The directory
    /// lock is held only long enough to do that; the returned handle is
    /// what actually serializes commits to this one stream.
    async fn stream_slot(&self, bucket_id: &str, stream_id: &str) -> Arc<Mutex<StreamState>> {
        let mut streams = self.streams.lock().await;
        streams
            .entry((bucket_id.to_owned(), stream_id.to_owned()))
            .or_insert_with(|| Arc::new(Mutex::new(StreamState::default())))
            .clone()
    }

    /// Snapshot of every stream slot in `bucket_id`, taken under the
    /// directory lock. Each slot is then locked independently by the
    /// caller, so this never holds the directory lock across an await.
    async fn bucket_slots(&self, bucket_id: &str) -> Vec<Arc<Mutex<StreamState>>> {
        let streams = self.streams.lock().await;
        streams
            .iter()
            .filter(|((bucket, _), _)| bucket == bucket_id)
            .map(|(_, slot)| slot.clone())
            .collect()
    }
}

#[async_trait]
impl CommitStore for InMemoryCommitStore {
    async fn get_from(
        &self,
        bucket_id: &str,
        stream_id: &str,
        min_revision: u64,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Commit>, CommitStoreError> {
        if cancel.is_cancelled() {
            return Err(CommitStoreError::Cancelled {
                bucket_id: bucket_id.to_owned(),
                stream_id: stream_id.to_owned(),
            });
        }

        let slot = {
            let streams = self.streams.lock().await;
            streams.get(&(bucket_id.to_owned(), stream_id.to_owned())).cloned()
        };
        let Some(slot) = slot else {
            return Ok(Vec::new());
        };

        let state = slot.lock().await;
        Ok(state
            .commits
            .iter()
            .filter(|commit| {
                let first = commit.first_event_revision();
                first <= max_revision && commit.stream_revision >= min_revision
            })
            .cloned()
            .collect())
    }

    async fn commit(
        &self,
        attempt: CommitAttempt,
        cancel: &CancellationToken,
    ) -> Result<Commit, CommitStoreError> {
        if cancel.is_cancelled() {
            return Err(CommitStoreError::Cancelled {
                bucket_id: attempt.bucket_id,
                stream_id: attempt.stream_id,
            });
        }

        let slot = self.stream_slot(&attempt.bucket_id, &attempt.stream_id).await;
        let mut state = slot.lock().await;

        let expected_sequence = state.commits.len() as u64 + 1;
        if attempt.commit_sequence != expected_sequence {
            return Err(CommitStoreError::Concurrency {
                bucket_id: attempt.bucket_id,
                stream_id: attempt.stream_id,
                observed_sequence: state.commits.len() as u64,
            });
        }

        if state.commits.iter().any(|c| c.commit_id == attempt.commit_id) {
            return Err(CommitStoreError::DuplicateCommit {
                bucket_id: attempt.bucket_id,
                stream_id: attempt.stream_id,
                commit_id: attempt.commit_id,
            });
        }

        let commit = Commit {
            bucket_id: attempt.bucket_id,
            stream_id: attempt.stream_id,
            commit_id: attempt.commit_id,
            commit_sequence: attempt.commit_sequence,
            stream_revision: attempt.stream_revision,
            commit_stamp: attempt.commit_stamp,
            headers: attempt.headers,
            events: attempt.events,
            checkpoint_token: Some(self.next_checkpoint_token()),
            is_dispatched: false,
        };

        state.commits.push(commit.clone());
        Ok(commit)
    }

    async fn mark_dispatched(
        &self,
        bucket_id: &str,
        stream_id: &str,
        commit_id: Uuid,
    ) -> Result<(), CommitStoreError> {
        let slot = {
            let streams = self.streams.lock().await;
            streams.get(&(bucket_id.to_owned(), stream_id.to_owned())).cloned()
        };
        let Some(slot) = slot else {
            return Err(CommitStoreError::StreamNotFound {
                bucket_id: bucket_id.to_owned(),
                stream_id: stream_id.to_owned(),
            });
        };

        let mut state = slot.lock().await;
        for commit in state.commits.iter_mut() {
            if commit.commit_id == commit_id {
                commit.is_dispatched = true;
                return Ok(());
            }
        }

        Err(CommitStoreError::StreamNotFound {
            bucket_id: bucket_id.to_owned(),
            stream_id: stream_id.to_owned(),
        })
    }

    async fn get_undispatched(&self, bucket_id: &str) -> Result<Vec<Commit>, CommitStoreError> {
        let mut undispatched = Vec::new();
        for slot in self.bucket_slots(bucket_id).await {
            let state = slot.lock().await;
            undispatched.extend(state.commits.iter().filter(|c| !c.is_dispatched).cloned());
        }
        Ok(undispatched)
    }

    async fn get_snapshot(
        &self,
        bucket_id: &str,
        stream_id: &str,
        max_revision: u64,
    ) -> Result<Option<Snapshot>, CommitStoreError> {
        let slot = {
            let streams = self.streams.lock().await;
            streams.get(&(bucket_id.to_owned(), stream_id.to_owned())).cloned()
        };
        let Some(slot) = slot else {
            return Ok(None);
        };

        let state = slot.lock().await;
        Ok(state.snapshot.clone().filter(|snapshot| snapshot.stream_revision <= max_revision))
    }

    async fn add_snapshot(&self, snapshot: Snapshot) -> Result<(), CommitStoreError> {
        let slot = self.stream_slot(&snapshot.bucket_id, &snapshot.stream_id).await;
        let mut state = slot.lock().await;
        state.snapshot = Some(snapshot);
        Ok(())
    }

    async fn delete_stream(&self, bucket_id: &str, stream_id: &str) -> Result<(), CommitStoreError> {
        let mut streams = self.streams.lock().await;
        streams.remove(&(bucket_id.to_owned(), stream_id.to_owned()));
        Ok(())
    }

    async fn purge(&self, bucket_id: &str) -> Result<(), CommitStoreError> {
        let mut streams = self.streams.lock().await;
        streams.retain(|(bucket, _), _| bucket != bucket_id);
        Ok(())
    }
}
