use std::sync::Arc;

use crate::{InMemoryCommitStore, OptimisticEventStream};

use super::{assert_bodies, init_tracing, seed_four_commits};

#[tokio::test]
async fn range_load_keeps_only_the_requested_window() {
    init_tracing();
    let store = Arc::new(InMemoryCommitStore::new());
    seed_four_commits(&store, "bucket", "stream-a").await;

    let cancel = tokio_util::sync::CancellationToken::new();
    let session = OptimisticEventStream::load_range("bucket", "stream-a", store, 2, 7, &cancel)
        .await
        .expect("load range");

    assert_eq!(session.stream_revision(), 7);
    assert_eq!(session.commit_sequence(), 4);
    assert_bodies(&session.committed_events(), &["e2", "e3", "e4", "e5", "e6", "e7"]);
    assert_eq!(session.committed_events().len(), 6);
}

#[tokio::test]
async fn opening_the_full_stream_returns_every_event() {
    init_tracing();
    let store = Arc::new(InMemoryCommitStore::new());
    seed_four_commits(&store, "bucket", "stream-a").await;

    let cancel = tokio_util::sync::CancellationToken::new();
    let session = OptimisticEventStream::load_range("bucket", "stream-a", store, 0, u64::MAX, &cancel)
        .await
        .expect("load range");

    assert_eq!(session.stream_revision(), 8);
    assert_eq!(session.committed_events().len(), 8);
}

#[tokio::test]
async fn loading_with_nonzero_min_revision_on_an_empty_stream_is_not_found() {
    init_tracing();
    let store = Arc::new(InMemoryCommitStore::new());

    let cancel = tokio_util::sync::CancellationToken::new();
    let result = OptimisticEventStream::load_range("bucket", "ghost-stream", store, 1, u64::MAX, &cancel).await;

    assert!(matches!(
        result,
        Err(crate::StreamSessionError::StreamNotFound { .. })
    ));
}

#[tokio::test]
async fn loading_an_empty_stream_from_zero_succeeds_with_no_events() {
    init_tracing();
    let store = Arc::new(InMemoryCommitStore::new());

    let cancel = tokio_util::sync::CancellationToken::new();
    let session = OptimisticEventStream::load_range("bucket", "ghost-stream", store, 0, u64::MAX, &cancel)
        .await
        .expect("empty stream from revision zero is not an error");

    assert_eq!(session.stream_revision(), 0);
    assert_eq!(session.committed_events().len(), 0);
}
