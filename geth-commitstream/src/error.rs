use thiserror::Error;
use uuid::Uuid;

/// Failures a `CommitStore` implementation surfaces to a session.
#[derive(Error, Debug)]
pub enum CommitStoreError {
    #[error("commit {commit_id} already exists for stream {bucket_id}/{stream_id}")]
    DuplicateCommit {
        bucket_id: String,
        stream_id: String,
        commit_id: Uuid,
    },

    #[error("concurrent writer appended to stream {bucket_id}/{stream_id} since sequence {observed_sequence}")]
    Concurrency {
        bucket_id: String,
        stream_id: String,
        observed_sequence: u64,
    },

    #[error("stream {bucket_id}/{stream_id} not found")]
    StreamNotFound { bucket_id: String, stream_id: String },

    #[error("operation on {bucket_id}/{stream_id} was cancelled")]
    Cancelled { bucket_id: String, stream_id: String },

    #[error("storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Failures a stream session surfaces to its caller. Distinct from
/// `CommitStoreError`: this is the taxonomy the application sees, which
/// wraps store failures rather than exposing store internals directly.
#[derive(Error, Debug)]
pub enum StreamSessionError {
    #[error("{0} must not be null")]
    NullArgument(&'static str),

    #[error("session is disposed")]
    Disposed,

    #[error("stream {bucket_id}/{stream_id} not found")]
    StreamNotFound { bucket_id: String, stream_id: String },

    #[error("commit {commit_id} already applied to stream {bucket_id}/{stream_id}")]
    DuplicateCommit {
        bucket_id: String,
        stream_id: String,
        commit_id: Uuid,
    },

    #[error("concurrent writer appended to stream {bucket_id}/{stream_id}")]
    Concurrency { bucket_id: String, stream_id: String },

    #[error(transparent)]
    Storage(CommitStoreError),

    #[error("{0} does not support mutation")]
    UnsupportedOperation(&'static str),
}

impl From<CommitStoreError> for StreamSessionError {
    /// Maps a store-level failure onto the session's own taxonomy.
    /// `Duplicate`/`Concurrency`/`StreamNotFound` get dedicated variants;
    /// everything else (including cancellation) is carried as `Storage`.
    fn from(err: CommitStoreError) -> Self {
        match err {
            CommitStoreError::DuplicateCommit {
                bucket_id,
                stream_id,
                commit_id,
            } => StreamSessionError::DuplicateCommit {
                bucket_id,
                stream_id,
                commit_id,
            },
            CommitStoreError::Concurrency {
                bucket_id,
                stream_id,
                ..
            } => StreamSessionError::Concurrency { bucket_id, stream_id },
            CommitStoreError::StreamNotFound { bucket_id, stream_id } => {
                StreamSessionError::StreamNotFound { bucket_id, stream_id }
            }
            other => StreamSessionError::Storage(other),
        }
    }
}

impl StreamSessionError {
    /// `true` for conflicts a caller is expected to resolve by rebuilding
    /// its decision and retrying, as opposed to a programming error.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, StreamSessionError::Concurrency { .. })
    }
}
