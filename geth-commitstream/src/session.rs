use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::StreamSessionError;
use crate::store::CommitStore;
use crate::types::{Commit, CommitAttempt, EventMessage};
use crate::view::{EventView, HeaderView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Disposed,
}

/// The in-memory object mediating between an application aggregate and a
/// pluggable `CommitStore`. Single-owner: exactly one caller may invoke
/// operations on a given session at a time; sharing across tasks requires
/// external serialization (e.g. behind a `tokio::sync::Mutex`).
pub struct OptimisticEventStream {
    bucket_id: String,
    stream_id: String,
    store: Arc<dyn CommitStore>,
    clock: Arc<dyn Clock>,

    stream_revision: u64,
    commit_sequence: u64,
    committed_events: Vec<EventMessage>,
    committed_headers: HashMap<String, Bytes>,
    uncommitted_events: Vec<EventMessage>,
    uncommitted_headers: HashMap<String, Bytes>,
    seen_commit_ids: HashSet<Uuid>,
    state: SessionState,
}

impl OptimisticEventStream {
    /// Fresh session: `streamRevision = 0`, `commitSequence = 0`, no load.
    pub fn fresh(bucket_id: impl Into<String>, stream_id: impl Into<String>, store: Arc<dyn CommitStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            stream_id: stream_id.into(),
            store,
            clock,
            stream_revision: 0,
            commit_sequence: 0,
            committed_events: Vec::new(),
            committed_headers: HashMap::new(),
            uncommitted_events: Vec::new(),
            uncommitted_headers: HashMap::new(),
            seen_commit_ids: HashSet::new(),
            state: SessionState::Open,
        }
    }

    /// Eagerly reads commits of `[min_revision, max_revision]` from `store`
    /// and folds them into the session's committed view. Fails with
    /// `StreamNotFoundError` if `min_revision > 0` and the store returned
    /// no commits at all.
    #[instrument(skip(store, clock, cancel), fields(bucket_id = %bucket_id.as_ref(), stream_id = %stream_id.as_ref()))]
    pub async fn load_range(
        bucket_id: impl AsRef<str> + Into<String>,
        stream_id: impl AsRef<str> + Into<String>,
        store: Arc<dyn CommitStore>,
        min_revision: u64,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<Self, StreamSessionError> {
        Self::load_range_with_clock(bucket_id, stream_id, store, Arc::new(crate::clock::SystemClock), min_revision, max_revision, cancel).await
    }

    pub(crate) async fn load_range_with_clock(
        bucket_id: impl AsRef<str> + Into<String>,
        stream_id: impl AsRef<str> + Into<String>,
        store: Arc<dyn CommitStore>,
        clock: Arc<dyn Clock>,
        min_revision: u64,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<Self, StreamSessionError> {
        let bucket_ref = bucket_id.as_ref().to_owned();
        let stream_ref = stream_id.as_ref().to_owned();
        let commits = store
            .get_from(&bucket_ref, &stream_ref, min_revision, max_revision, cancel)
            .await?;

        if min_revision > 0 && commits.is_empty() {
            return Err(StreamSessionError::StreamNotFound {
                bucket_id: bucket_ref,
                stream_id: stream_ref,
            });
        }

        let mut session = Self::fresh(bucket_id, stream_id, store, clock);
        session.fold(commits, min_revision, max_revision);
        Ok(session)
    }

    /// Loads commits starting at `snapshot.stream_revision + 1`, with the
    /// session's `stream_revision` initialized from the snapshot baseline
    /// before folding (set once; folding bumps it further as events are
    /// kept, never re-set).
    #[instrument(skip(snapshot, store, clock, cancel), fields(bucket_id = %snapshot.bucket_id, stream_id = %snapshot.stream_id))]
    pub async fn load_from_snapshot(
        snapshot: crate::types::Snapshot,
        store: Arc<dyn CommitStore>,
        clock: Arc<dyn Clock>,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<Self, StreamSessionError> {
        let min_revision = snapshot.stream_revision + 1;
        let commits = store
            .get_from(&snapshot.bucket_id, &snapshot.stream_id, min_revision, max_revision, cancel)
            .await?;

        let mut session = Self::fresh(snapshot.bucket_id, snapshot.stream_id, store, clock);
        session.stream_revision = snapshot.stream_revision;
        session.fold(commits, min_revision, max_revision);
        Ok(session)
    }

    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn stream_revision(&self) -> u64 {
        self.stream_revision
    }

    pub fn commit_sequence(&self) -> u64 {
        self.commit_sequence
    }

    pub fn committed_events(&self) -> EventView<'_> {
        EventView::new("committed_events", &self.committed_events)
    }

    pub fn committed_headers(&self) -> HeaderView<'_> {
        HeaderView::new("committed_headers", &self.committed_headers)
    }

    pub fn uncommitted_events(&self) -> EventView<'_> {
        EventView::new("uncommitted_events", &self.uncommitted_events)
    }

    pub fn uncommitted_headers(&self) -> &HashMap<String, Bytes> {
        &self.uncommitted_headers
    }

    /// The only mutable collection exposed by the session.
    pub fn uncommitted_headers_mut(&mut self) -> &mut HashMap<String, Bytes> {
        &mut self.uncommitted_headers
    }

    pub fn is_disposed(&self) -> bool {
        self.state == SessionState::Disposed
    }

    /// Appends `event` to the uncommitted buffer. No revision is assigned
    /// until `commit_changes` succeeds.
    pub fn add(&mut self, event: EventMessage) -> Result<(), StreamSessionError> {
        self.require_open()?;

        if event.body.is_empty() {
            return Err(StreamSessionError::NullArgument("event.body"));
        }

        self.uncommitted_events.push(event);
        Ok(())
    }

    /// Drops uncommitted events and uncommitted headers.
    pub fn clear_changes(&mut self) -> Result<(), StreamSessionError> {
        self.require_open()?;
        self.uncommitted_events.clear();
        self.uncommitted_headers.clear();
        Ok(())
    }

    /// Marks the session terminal. Any subsequent effectful operation
    /// fails with `DisposedError`.
    pub fn dispose(&mut self) {
        self.state = SessionState::Disposed;
    }

    /// Persists the uncommitted buffer as one commit.
    ///
    /// - No-op (returns `Ok(())` without touching the store) if the
    ///   buffer is empty.
    /// - `DuplicateCommitError` locally if `commit_id` has already been
    ///   folded or persisted by this session.
    /// - On a store-side `ConcurrencyError`, reconciles by folding in
    ///   commits durable since `stream_revision + 1` before re-raising;
    ///   the uncommitted buffer is left intact.
    #[instrument(skip(self, cancel), fields(bucket_id = %self.bucket_id, stream_id = %self.stream_id, commit_id = %commit_id))]
    pub async fn commit_changes(
        &mut self,
        commit_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), StreamSessionError> {
        self.require_open()?;

        if self.seen_commit_ids.contains(&commit_id) {
            return Err(StreamSessionError::DuplicateCommit {
                bucket_id: self.bucket_id.clone(),
                stream_id: self.stream_id.clone(),
                commit_id,
            });
        }

        if self.uncommitted_events.is_empty() {
            return Ok(());
        }

        let attempt = CommitAttempt {
            bucket_id: self.bucket_id.clone(),
            stream_id: self.stream_id.clone(),
            commit_id,
            commit_sequence: self.commit_sequence + 1,
            stream_revision: self.stream_revision + self.uncommitted_events.len() as u64,
            commit_stamp: self.clock.now(),
            headers: self.uncommitted_headers.clone(),
            events: self.uncommitted_events.clone(),
        };

        let attempt_stream_revision = attempt.stream_revision;
        let fold_from = self.stream_revision + 1;

        match self.store.commit(attempt, cancel).await {
            Ok(persisted) => {
                self.fold(vec![persisted], fold_from, attempt_stream_revision);
                self.uncommitted_events.clear();
                self.uncommitted_headers.clear();
                Ok(())
            }
            Err(err) => {
                let session_err = StreamSessionError::from(err);
                if session_err.is_concurrency_conflict() {
                    tracing::debug!("concurrency conflict, reconciling");
                    let newer = self
                        .store
                        .get_from(&self.bucket_id, &self.stream_id, fold_from, u64::MAX, cancel)
                        .await?;
                    self.fold(newer, fold_from, u64::MAX);
                }
                Err(session_err)
            }
        }
    }

    fn require_open(&self) -> Result<(), StreamSessionError> {
        if self.state == SessionState::Disposed {
            return Err(StreamSessionError::Disposed);
        }
        Ok(())
    }

    /// Folds `commits` (in store order) into the committed view, keeping
    /// only events whose revision falls in `[min_revision, max_revision]`.
    /// `commit_sequence` tracks the last commit *observed*, even when its
    /// events lie fully above `max_revision`; `stream_revision` tracks the
    /// revision of the last event actually *kept*.
    fn fold(&mut self, commits: Vec<Commit>, min_revision: u64, max_revision: u64) {
        for commit in commits {
            self.seen_commit_ids.insert(commit.commit_id);
            self.commit_sequence = commit.commit_sequence;

            let first = commit.first_event_revision();
            if first > max_revision {
                break;
            }

            for (key, value) in commit.headers.iter() {
                self.committed_headers.insert(key.clone(), value.clone());
            }

            let mut cur = first;
            for event in commit.events {
                if cur > max_revision {
                    break;
                }

                if cur >= min_revision {
                    self.committed_events.push(event);
                    self.stream_revision = cur;
                }

                cur += 1;
            }
        }
    }
}
