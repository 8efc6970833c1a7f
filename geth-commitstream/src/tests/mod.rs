mod fold;
mod store;

use std::sync::Once;

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::{CommitStore, EventMessage, InMemoryCommitStore};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

fn event(body: &str) -> EventMessage {
    EventMessage::new(Bytes::from(body.to_owned()))
}

/// Seeds `store` with a fixed fixture of four commits on one stream:
/// C1{rev=2,seq=1,[e1,e2]}, C2{rev=4,seq=2,[e3,e4]},
/// C3{rev=6,seq=3,[e5,e6]}, C4{rev=8,seq=4,[e7,e8]}.
///
/// `C4` gets `commit_sequence = 4`, not a repeated `3` as some fixtures
/// elsewhere use — sequences are strictly monotone in this crate's own
/// test data.
async fn seed_four_commits(store: &InMemoryCommitStore, bucket: &str, stream: &str) {
    let cancel = tokio_util::sync::CancellationToken::new();
    let groups = [
        (1u64, 2u64, vec!["e1", "e2"]),
        (2, 4, vec!["e3", "e4"]),
        (3, 6, vec!["e5", "e6"]),
        (4, 8, vec!["e7", "e8"]),
    ];

    for (seq, rev, bodies) in groups {
        let attempt = crate::CommitAttempt {
            bucket_id: bucket.to_owned(),
            stream_id: stream.to_owned(),
            commit_id: Uuid::new_v4(),
            commit_sequence: seq,
            stream_revision: rev,
            commit_stamp: Utc::now(),
            headers: Default::default(),
            events: bodies.into_iter().map(event).collect(),
        };
        store.commit(attempt, &cancel).await.expect("seed commit");
    }
}

fn assert_bodies(events: &[EventMessage], expected: &[&str]) {
    let bodies: Vec<String> = events
        .iter()
        .map(|e| String::from_utf8(e.body.to_vec()).unwrap())
        .collect();
    assert_eq!(bodies, expected);
}
