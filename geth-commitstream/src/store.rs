use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CommitStoreError;
use crate::types::{Commit, CommitAttempt, Snapshot};

/// The abstract durable commit log a stream session is built on top of.
///
/// Implementations must make `commit` serializable per stream (leases,
/// conditional writes, transactions, or mutual exclusion are all valid
/// strategies); nothing above this trait assumes a particular mechanism.
#[async_trait]
pub trait CommitStore: Send + Sync {
    /// Commits of `stream_id` in `bucket_id`, ordered by `commit_sequence`
    /// ascending, whose stream-revision range intersects `[min_revision,
    /// max_revision]`. May return an empty sequence.
    async fn get_from(
        &self,
        bucket_id: &str,
        stream_id: &str,
        min_revision: u64,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Commit>, CommitStoreError>;

    /// Appends `attempt` atomically, returning the persisted `Commit`
    /// with any store-assigned fields filled in.
    async fn commit(
        &self,
        attempt: CommitAttempt,
        cancel: &CancellationToken,
    ) -> Result<Commit, CommitStoreError>;

    /// Flips the dispatched flag on an already-persisted commit. Owned by
    /// external dispatch machinery; orthogonal to the session's own
    /// commit-boundary state machine.
    async fn mark_dispatched(
        &self,
        bucket_id: &str,
        stream_id: &str,
        commit_id: uuid::Uuid,
    ) -> Result<(), CommitStoreError>;

    /// All commits across all streams in `bucket_id` that have not yet
    /// been marked dispatched, in no particular cross-stream order.
    async fn get_undispatched(&self, bucket_id: &str) -> Result<Vec<Commit>, CommitStoreError>;

    async fn get_snapshot(
        &self,
        bucket_id: &str,
        stream_id: &str,
        max_revision: u64,
    ) -> Result<Option<Snapshot>, CommitStoreError>;

    async fn add_snapshot(&self, snapshot: Snapshot) -> Result<(), CommitStoreError>;

    async fn delete_stream(&self, bucket_id: &str, stream_id: &str) -> Result<(), CommitStoreError>;

    /// Irrecoverably clears a bucket's commits, snapshots and dispatch
    /// bookkeeping. Distinct from `delete_stream`: scoped to the whole
    /// bucket, intended for test teardown and bulk administrative reset.
    async fn purge(&self, bucket_id: &str) -> Result<(), CommitStoreError>;
}

#[async_trait]
impl<T> CommitStore for std::sync::Arc<T>
where
    T: CommitStore + ?Sized,
{
    async fn get_from(
        &self,
        bucket_id: &str,
        stream_id: &str,
        min_revision: u64,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Commit>, CommitStoreError> {
        (**self)
            .get_from(bucket_id, stream_id, min_revision, max_revision, cancel)
            .await
    }

    async fn commit(
        &self,
        attempt: CommitAttempt,
        cancel: &CancellationToken,
    ) -> Result<Commit, CommitStoreError> {
        (**self).commit(attempt, cancel).await
    }

    async fn mark_dispatched(
        &self,
        bucket_id: &str,
        stream_id: &str,
        commit_id: uuid::Uuid,
    ) -> Result<(), CommitStoreError> {
        (**self).mark_dispatched(bucket_id, stream_id, commit_id).await
    }

    async fn get_undispatched(&self, bucket_id: &str) -> Result<Vec<Commit>, CommitStoreError> {
        (**self).get_undispatched(bucket_id).await
    }

    async fn get_snapshot(
        &self,
        bucket_id: &str,
        stream_id: &str,
        max_revision: u64,
    ) -> Result<Option<Snapshot>, CommitStoreError> {
        (**self).get_snapshot(bucket_id, stream_id, max_revision).await
    }

    async fn add_snapshot(&self, snapshot: Snapshot) -> Result<(), CommitStoreError> {
        (**self).add_snapshot(snapshot).await
    }

    async fn delete_stream(&self, bucket_id: &str, stream_id: &str) -> Result<(), CommitStoreError> {
        (**self).delete_stream(bucket_id, stream_id).await
    }

    async fn purge(&self, bucket_id: &str) -> Result<(), CommitStoreError> {
        (**self).purge(bucket_id).await
    }
}
