//! Accelerator backend module

pub mod device;
pub mod dummy_device;
pub mod tuning;

pub use device::{Accelerator, BufferHandle, EventHandle, KernelArg, KernelHandle, ProfilePhase};
pub use dummy_device::{DummyDevice, LaunchRecord};
pub use tuning::{global_work_size, WorkGroupTuner, WorkPlan};
