//! clforge - GPU operator execution and profiling engine
//!
//! Plans numeric operators once per shape (Resize) and submits them
//! repeatedly (Execute) against an abstract accelerator command stream, with
//! auto-tuned work-group partitioning and optional per-invocation timing
//! telemetry rendered as a sorted cost report.

pub mod backend;
pub mod error;
pub mod ops;
pub mod profiling;
pub mod tensor;

pub use backend::{Accelerator, BufferHandle, DummyDevice, EventHandle, KernelArg, KernelHandle,
    ProfilePhase, WorkGroupTuner, WorkPlan};
pub use error::{ClForgeError, ClResult, ErrorCategory};
pub use ops::{Execution, ExecutionRegistry, OpDescriptor, OpKind, OpParams, OperatorPlan,
    PadMode, PoolDescriptor, PoolExecution, PoolType};
pub use profiling::{ProfilingSample, ProfilingSession, ReportTable};
pub use tensor::{MemoryLayout, Tensor, TensorShape};
