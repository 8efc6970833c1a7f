use std::collections::HashMap;
use std::ops::Deref;

use bytes::Bytes;

use crate::error::StreamSessionError;
use crate::types::EventMessage;

/// A read-only view over a session's event buffer (`committedEvents` or
/// `uncommittedEvents`). Dereferences to a plain slice for reading;
/// any attempted structural mutation through the view itself fails with
/// `UnsupportedOperationError`, per the source contract — the underlying
/// buffer is not immutable, only this accessor is mutation-rejecting.
pub struct EventView<'a> {
    label: &'static str,
    events: &'a [EventMessage],
}

impl<'a> EventView<'a> {
    pub(crate) fn new(label: &'static str, events: &'a [EventMessage]) -> Self {
        Self { label, events }
    }

    pub fn add(&self, _event: EventMessage) -> Result<(), StreamSessionError> {
        Err(StreamSessionError::UnsupportedOperation(self.label))
    }

    pub fn remove(&self, _index: usize) -> Result<(), StreamSessionError> {
        Err(StreamSessionError::UnsupportedOperation(self.label))
    }

    pub fn clear(&self) -> Result<(), StreamSessionError> {
        Err(StreamSessionError::UnsupportedOperation(self.label))
    }
}

impl<'a> Deref for EventView<'a> {
    type Target = [EventMessage];

    fn deref(&self) -> &Self::Target {
        self.events
    }
}

/// A read-only view over a session's header map (`committedHeaders`).
/// Same mutation-rejection contract as `EventView`.
pub struct HeaderView<'a> {
    label: &'static str,
    headers: &'a HashMap<String, Bytes>,
}

impl<'a> HeaderView<'a> {
    pub(crate) fn new(label: &'static str, headers: &'a HashMap<String, Bytes>) -> Self {
        Self { label, headers }
    }

    pub fn insert(&self, _key: String, _value: Bytes) -> Result<(), StreamSessionError> {
        Err(StreamSessionError::UnsupportedOperation(self.label))
    }

    pub fn remove(&self, _key: &str) -> Result<(), StreamSessionError> {
        Err(StreamSessionError::UnsupportedOperation(self.label))
    }

    pub fn clear(&self) -> Result<(), StreamSessionError> {
        Err(StreamSessionError::UnsupportedOperation(self.label))
    }
}

impl<'a> Deref for HeaderView<'a> {
    type Target = HashMap<String, Bytes>;

    fn deref(&self) -> &Self::Target {
        self.headers
    }
}
