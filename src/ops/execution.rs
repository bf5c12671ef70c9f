//! Operator execution lifecycle
//!
//! Every accelerator-backed operator goes through two phases: `resize` runs
//! once whenever the input/output shapes are established or change and does
//! all shape-dependent work (kernel selection and compilation, work
//! partitioning, argument binding); `execute` runs once per inference step
//! and only submits the already-bound kernel. A plan is valid for exactly
//! the shape pair it was computed from.

use crate::backend::{KernelHandle, WorkGroupTuner};
use crate::error::ClResult;
use crate::profiling::ProfilingSession;
use crate::tensor::Tensor;

/// Shape-dependent state computed during resize, held until the next resize
/// or operator destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorPlan {
    /// Compiled kernel for this shape pair; released with the plan
    pub kernel: KernelHandle,
    pub global: [u32; 3],
    pub local: Option<[u32; 3]>,
    /// Input spatial extent [height, width]
    pub input_spatial: [i32; 2],
    /// Output spatial extent [height, width]
    pub output_spatial: [i32; 2],
    /// Leading-half padding offsets [height, width]
    pub pad_before: [i32; 2],
    pub stride: [i32; 2],
    pub kernel_window: [i32; 2],
    pub channel_blocks: i32,
}

/// The Resize/Execute contract every accelerator-backed operator implements.
///
/// `resize` must complete successfully before the first `execute`; any
/// resize failure leaves the operator unusable until a later resize
/// succeeds. `execute` never re-derives shape parameters.
pub trait Execution: Send {
    /// Plan for the given shapes: derive shape parameters, compile the
    /// kernel variant, partition the work, bind the argument list.
    fn resize(
        &mut self,
        inputs: &[Tensor],
        outputs: &[Tensor],
        tuner: &mut WorkGroupTuner,
    ) -> ClResult<()>;

    /// Submit the planned kernel once. With an enabled profiling session the
    /// completion is awaited and a timing sample recorded; otherwise the
    /// submission is fire-and-forget.
    fn execute(&mut self, profiling: &mut ProfilingSession) -> ClResult<()>;
}

impl std::fmt::Debug for dyn Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Execution")
    }
}
