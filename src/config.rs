//! Engine tuning knobs.

use std::time::Duration;

use crate::formats::FormatTable;

/// Timeouts and limits for one engine instance.
///
/// All three channels share one correlator, so a slow peer on one
/// channel stalls the other two for up to `request_timeout`. Keep these
/// bounded in seconds, never unbounded.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a single request/reply exchange may take.
    pub request_timeout: Duration,

    /// How long a drag source waits for the target to finish fetching
    /// after the pointer is released.
    pub drop_timeout: Duration,

    /// Largest payload a store accepts, in bytes.
    pub max_data_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(1000),
            drop_timeout: Duration::from_millis(5000),
            max_data_size: FormatTable::DEFAULT_MAX_SIZE,
        }
    }
}
