//! Accelerator command interface
//!
//! The accelerator runtime (kernel compilation, command stream, event
//! bookkeeping) lives behind the [`Accelerator`] trait. clforge only issues
//! commands through it: compile a kernel once per shape, bind positional
//! arguments, enqueue against planned work sizes, and — when profiling —
//! wait on the completion event and read its timestamps.

use crate::error::ClResult;

/// Opaque handle to a kernel compiled by the device.
///
/// Handles are only meaningful to the device that issued them. Binding or
/// enqueueing a handle the device does not recognize is a configuration
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelHandle(u64);

impl KernelHandle {
    pub fn new(raw: u64) -> Self {
        KernelHandle(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Opaque handle to a device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    pub fn new(raw: u64) -> Self {
        BufferHandle(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Completion handle for one enqueued kernel submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

impl EventHandle {
    pub fn new(raw: u64) -> Self {
        EventHandle(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// One positionally-bound kernel argument.
///
/// Argument order is a binding contract between the work planner's computed
/// values and the kernel's declared parameter list; kernels bind by position,
/// not by name, so an argument list must never be reordered or conditionally
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelArg {
    /// Scalar unsigned value (work-size dimensions)
    Uint(u32),
    /// Scalar signed value (counts)
    Int(i32),
    /// Packed two-element shape (height, width)
    Int2([i32; 2]),
    /// Device buffer
    Buffer(BufferHandle),
}

/// The four profiling timestamps a device reports per completed submission,
/// non-decreasing in declaration order, in nanoseconds since a device epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilePhase {
    Queued,
    Submitted,
    Started,
    Ended,
}

/// Commands clforge issues against an accelerator.
///
/// One instance owns one command stream; all calls for a given operator are
/// sequential relative to each other. The only blocking call is [`wait`],
/// which suspends the caller until the submission finishes — there is no
/// cancellation, a submitted kernel runs to completion or the device context
/// itself fails.
///
/// [`wait`]: Accelerator::wait
pub trait Accelerator: Send + Sync {
    /// Compile `kernel` from `program` with the given build options.
    ///
    /// Fails with `ClForgeError::Compile` on bad source or flags.
    fn compile_kernel(
        &self,
        program: &str,
        kernel: &str,
        build_options: &[String],
    ) -> ClResult<KernelHandle>;

    /// Maximum work-group size the device supports for this compiled kernel.
    ///
    /// A reported size of zero means the kernel cannot be partitioned and
    /// the planner must refuse to proceed.
    fn max_work_group_size(&self, kernel: KernelHandle) -> ClResult<u64>;

    /// Bind the full positional argument list onto a compiled kernel.
    ///
    /// Fails with `ClForgeError::Configuration` if the handle was not
    /// successfully compiled by this device.
    fn set_kernel_args(&self, kernel: KernelHandle, args: &[KernelArg]) -> ClResult<()>;

    /// Submit the kernel onto the command stream.
    ///
    /// `local` of `None` leaves work-group partitioning to the device.
    fn enqueue_kernel(
        &self,
        kernel: KernelHandle,
        global: [u32; 3],
        local: Option<[u32; 3]>,
    ) -> ClResult<EventHandle>;

    /// Block until the submission behind `event` has finished
    fn wait(&self, event: EventHandle) -> ClResult<()>;

    /// Read one profiling timestamp of a finished submission, in nanoseconds
    fn event_timestamp(&self, event: EventHandle, phase: ProfilePhase) -> ClResult<u64>;

    /// Release a compiled kernel. Releasing an unknown handle is a no-op.
    fn release_kernel(&self, kernel: KernelHandle);
}
