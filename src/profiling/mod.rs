//! Profiling infrastructure for clforge
//!
//! Per-invocation GPU timing telemetry: [`ProfilingSample`] extraction from
//! completion events, [`ProfilingSession`] aggregation across invocations,
//! and the sorted fixed-width cost report.

pub mod report;
pub mod sample;

pub use report::{double_to_string, double_to_string_filter, ProfilingSession, ReportTable};
pub use sample::ProfilingSample;
