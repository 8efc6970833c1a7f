use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::StreamSessionError;
use crate::session::OptimisticEventStream;
use crate::store::CommitStore;
use crate::types::Snapshot;

/// Gathers the three construction forms of `OptimisticEventStream` behind
/// one entry point bound to a `CommitStore` and a `Clock`, the way
/// `geth-mikoshi::Mikoshi` wraps a `Backend`.
pub struct StreamSessionFactory {
    store: Arc<dyn CommitStore>,
    clock: Arc<dyn Clock>,
}

impl StreamSessionFactory {
    pub fn new(store: Arc<dyn CommitStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn open(&self, bucket_id: impl Into<String>, stream_id: impl Into<String>) -> OptimisticEventStream {
        OptimisticEventStream::fresh(bucket_id, stream_id, self.store.clone(), self.clock.clone())
    }

    pub async fn open_range(
        &self,
        bucket_id: impl AsRef<str> + Into<String>,
        stream_id: impl AsRef<str> + Into<String>,
        min_revision: u64,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<OptimisticEventStream, StreamSessionError> {
        OptimisticEventStream::load_range_with_clock(
            bucket_id,
            stream_id,
            self.store.clone(),
            self.clock.clone(),
            min_revision,
            max_revision,
            cancel,
        )
        .await
    }

    pub async fn open_from_snapshot(
        &self,
        snapshot: Snapshot,
        max_revision: u64,
        cancel: &CancellationToken,
    ) -> Result<OptimisticEventStream, StreamSessionError> {
        OptimisticEventStream::load_from_snapshot(snapshot, self.store.clone(), self.clock.clone(), max_revision, cancel).await
    }
}
