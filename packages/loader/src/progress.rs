//! Progress hooks for the startup geocoding pass.
//!
//! [`enrich::geocode_samples`](crate::enrich::geocode_samples) reports one
//! unit per row through [`ProgressCallback`]; the server binary draws it as
//! a terminal bar and tests pass [`NullProgress`].

use std::sync::Arc;

/// Receives geocoding progress, one unit per sample row.
pub trait ProgressCallback: Send + Sync {
    /// Number of rows about to be geocoded.
    fn set_total(&self, total: u64);

    /// `delta` more rows are done.
    fn inc(&self, delta: u64);

    /// Row currently being looked up.
    fn set_message(&self, msg: String);

    /// The pass is over; `msg` summarizes the outcome.
    fn finish(&self, msg: String);
}

/// Discards all progress.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// A shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
