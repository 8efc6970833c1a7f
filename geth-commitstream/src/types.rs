use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single domain fact. `body` is the only mandatory field; headers are
/// free-form and optional. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub body: Bytes,
    pub headers: HashMap<String, Bytes>,
}

impl EventMessage {
    pub fn new(body: Bytes) -> Self {
        Self {
            body,
            headers: HashMap::new(),
        }
    }

    pub fn with_headers(body: Bytes, headers: HashMap<String, Bytes>) -> Self {
        Self { body, headers }
    }
}

/// An atomic, durably-persisted group of events for one stream.
///
/// Invariants (enforced by a conforming `CommitStore`, not by this type):
/// `stream_revision(n) = stream_revision(n-1) + events(n).len()`,
/// `commit_sequence` is contiguous from 1, `commit_id` is unique per
/// stream, `events` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub bucket_id: String,
    pub stream_id: String,
    pub commit_id: Uuid,
    pub commit_sequence: u64,
    pub stream_revision: u64,
    pub commit_stamp: DateTime<Utc>,
    pub headers: HashMap<String, Bytes>,
    pub events: Vec<EventMessage>,
    pub checkpoint_token: Option<u64>,
    pub is_dispatched: bool,
}

impl Commit {
    /// Revision of the first event in this commit.
    pub fn first_event_revision(&self) -> u64 {
        self.stream_revision - self.events.len() as u64 + 1
    }
}

/// The pre-durability intent a session submits to a `CommitStore`.
/// Same shape as `Commit` minus the store-assigned `checkpoint_token`
/// and `is_dispatched`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAttempt {
    pub bucket_id: String,
    pub stream_id: String,
    pub commit_id: Uuid,
    pub commit_sequence: u64,
    pub stream_revision: u64,
    pub commit_stamp: DateTime<Utc>,
    pub headers: HashMap<String, Bytes>,
    pub events: Vec<EventMessage>,
}

/// A point-in-time compaction of a stream's state, used to bound the
/// range a session needs to fold on load. Opaque to the session beyond
/// the fields below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub bucket_id: String,
    pub stream_id: String,
    pub stream_revision: u64,
    pub payload: Bytes,
}
