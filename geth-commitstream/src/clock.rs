use chrono::{DateTime, Utc};

/// Injectable time source. Recast from the source's process-wide mutable
/// clock into a capability passed to the session factory, so tests can
/// substitute a deterministic clock without touching global state.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The clock used in production: wall-clock UTC time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
