use chrono::Utc;
use uuid::Uuid;

use crate::{CommitAttempt, CommitStore, CommitStoreError, InMemoryCommitStore, Snapshot};

use super::{event, init_tracing};

fn attempt(bucket: &str, stream: &str, seq: u64, revision: u64, commit_id: Uuid) -> CommitAttempt {
    CommitAttempt {
        bucket_id: bucket.to_owned(),
        stream_id: stream.to_owned(),
        commit_id,
        commit_sequence: seq,
        stream_revision: revision,
        commit_stamp: Utc::now(),
        headers: Default::default(),
        events: vec![event("e")],
    }
}

#[tokio::test]
async fn rejects_a_commit_sequence_gap() {
    init_tracing();
    let store = InMemoryCommitStore::new();
    let cancel = tokio_util::sync::CancellationToken::new();

    let result = store.commit(attempt("b", "s", 2, 1, Uuid::new_v4()), &cancel).await;
    assert!(matches!(result, Err(CommitStoreError::Concurrency { .. })));
}

#[tokio::test]
async fn rejects_a_reused_commit_id_within_a_stream() {
    init_tracing();
    let store = InMemoryCommitStore::new();
    let cancel = tokio_util::sync::CancellationToken::new();
    let commit_id = Uuid::new_v4();

    store.commit(attempt("b", "s", 1, 1, commit_id), &cancel).await.expect("first");
    let result = store.commit(attempt("b", "s", 2, 2, commit_id), &cancel).await;

    assert!(matches!(result, Err(CommitStoreError::DuplicateCommit { .. })));
}

#[tokio::test]
async fn assigns_monotonically_increasing_checkpoint_tokens_across_streams() {
    init_tracing();
    let store = InMemoryCommitStore::new();
    let cancel = tokio_util::sync::CancellationToken::new();

    let c1 = store
        .commit(attempt("b", "s1", 1, 1, Uuid::new_v4()), &cancel)
        .await
        .expect("commit s1");
    let c2 = store
        .commit(attempt("b", "s2", 1, 1, Uuid::new_v4()), &cancel)
        .await
        .expect("commit s2");

    assert!(c2.checkpoint_token.unwrap() > c1.checkpoint_token.unwrap());
}

#[tokio::test]
async fn mark_dispatched_removes_a_commit_from_the_undispatched_set() {
    init_tracing();
    let store = InMemoryCommitStore::new();
    let cancel = tokio_util::sync::CancellationToken::new();
    let commit_id = Uuid::new_v4();

    store.commit(attempt("b", "s", 1, 1, commit_id), &cancel).await.expect("commit");
    assert_eq!(store.get_undispatched("b").await.unwrap().len(), 1);

    store.mark_dispatched("b", "s", commit_id).await.expect("mark dispatched");
    assert_eq!(store.get_undispatched("b").await.unwrap().len(), 0);
}

#[tokio::test]
async fn snapshots_round_trip_and_respect_the_max_revision_bound() {
    init_tracing();
    let store = InMemoryCommitStore::new();

    store
        .add_snapshot(Snapshot {
            bucket_id: "b".to_owned(),
            stream_id: "s".to_owned(),
            stream_revision: 10,
            payload: bytes::Bytes::from_static(b"state"),
        })
        .await
        .expect("add snapshot");

    assert!(store.get_snapshot("b", "s", 20).await.unwrap().is_some());
    assert!(store.get_snapshot("b", "s", 5).await.unwrap().is_none());
}

#[tokio::test]
async fn purge_clears_every_stream_in_a_bucket_but_not_other_buckets() {
    init_tracing();
    let store = InMemoryCommitStore::new();
    let cancel = tokio_util::sync::CancellationToken::new();

    store.commit(attempt("b1", "s", 1, 1, Uuid::new_v4()), &cancel).await.expect("commit b1");
    store.commit(attempt("b2", "s", 1, 1, Uuid::new_v4()), &cancel).await.expect("commit b2");

    store.purge("b1").await.expect("purge");

    assert_eq!(store.get_from("b1", "s", 0, u64::MAX, &cancel).await.unwrap().len(), 0);
    assert_eq!(store.get_from("b2", "s", 0, u64::MAX, &cancel).await.unwrap().len(), 1);
}

#[tokio::test]
async fn a_cancelled_token_surfaces_as_cancellation_before_any_mutation() {
    init_tracing();
    let store = InMemoryCommitStore::new();
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();

    let result = store.commit(attempt("b", "s", 1, 1, Uuid::new_v4()), &cancel).await;
    assert!(matches!(result, Err(CommitStoreError::Cancelled { .. })));
    assert_eq!(store.get_undispatched("b").await.unwrap().len(), 0);
}
