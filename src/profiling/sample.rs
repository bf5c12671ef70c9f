//! Per-invocation timing extraction
//!
//! One [`ProfilingSample`] is produced per finished kernel submission by
//! waiting on its completion event and reading the device's four profiling
//! timestamps in the fixed order queued → submitted → started → ended. Each
//! read is fallible and fatal for the extraction; timestamps are not
//! independently optional.
//!
//! Extraction blocks the calling thread by design — profiling correctness
//! requires the wait, so a profiled invocation's completion serializes with
//! subsequent host logic. That cost is only paid when a session has
//! profiling enabled.

use crate::backend::device::{Accelerator, EventHandle, ProfilePhase};
use crate::error::ClResult;

const NS_PER_MS: f64 = 1_000_000.0;

/// Timing record of one kernel invocation.
///
/// Raw timestamps are nanoseconds since a device-defined epoch and are
/// non-decreasing in field order by device contract, so the derived
/// intervals are always >= 0. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilingSample {
    pub event_queued: u64,
    pub event_submitted: u64,
    pub event_started: u64,
    pub event_ended: u64,
    /// Host enqueue to driver submission, milliseconds
    pub enqueue_time: f64,
    /// Driver submission to execution start, milliseconds
    pub submit_time: f64,
    /// Kernel execution, milliseconds
    pub kernel_time: f64,
}

impl ProfilingSample {
    /// Derive the millisecond intervals from four raw device timestamps
    pub fn from_timestamps(queued: u64, submitted: u64, started: u64, ended: u64) -> Self {
        ProfilingSample {
            event_queued: queued,
            event_submitted: submitted,
            event_started: started,
            event_ended: ended,
            enqueue_time: (submitted as f64 - queued as f64) / NS_PER_MS,
            submit_time: (started as f64 - submitted as f64) / NS_PER_MS,
            kernel_time: (ended as f64 - started as f64) / NS_PER_MS,
        }
    }

    /// Block until `event` completes, then read its four timestamps.
    ///
    /// Propagates `DeviceWait` from the completion wait and `DeviceQuery`
    /// from any timestamp read; neither is retried.
    pub fn collect(device: &dyn Accelerator, event: EventHandle) -> ClResult<Self> {
        device.wait(event)?;
        let queued = device.event_timestamp(event, ProfilePhase::Queued)?;
        let submitted = device.event_timestamp(event, ProfilePhase::Submitted)?;
        let started = device.event_timestamp(event, ProfilePhase::Started)?;
        let ended = device.event_timestamp(event, ProfilePhase::Ended)?;
        let sample = ProfilingSample::from_timestamps(queued, submitted, started, ended);
        tracing::trace!(
            "profiled event {}: enqueue {:.3} ms, submit {:.3} ms, kernel {:.3} ms",
            event.raw(),
            sample.enqueue_time,
            sample.submit_time,
            sample.kernel_time
        );
        Ok(sample)
    }
}
