//! Spatial pooling operator
//!
//! Buffer-layout pooling over NHWC tensors with channels packed in blocks of
//! 4. The average/max variant is baked into the compiled kernel through a
//! build option chosen at resize time and carried in the plan — never a
//! runtime branch in execute.
//!
//! Argument binding contract (positional, fixed per operator kind):
//! global size x/y/z, input buffer, input spatial shape, output spatial
//! shape, padding-before shape, stride shape, kernel-window shape, output
//! buffer, channel-block count.

use std::sync::Arc;

use crate::backend::{global_work_size, Accelerator, KernelArg, WorkGroupTuner};
use crate::error::{ClForgeError, ClResult};
use crate::ops::execution::{Execution, OperatorPlan};
use crate::profiling::{ProfilingSample, ProfilingSession};
use crate::tensor::Tensor;

const PROGRAM_NAME: &str = "pooling_buf";
const KERNEL_NAME: &str = "pooling";

/// Pooling reduction kind, fixed per operator instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolType {
    Average,
    Max,
}

/// How spatial padding is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    /// Use the configured pad amounts as-is
    Explicit,
    /// No padding, regardless of configured amounts
    Valid,
    /// Pad so the output covers the input: max(0, (out-1)*stride + kernel - in)
    Same,
}

/// Static pooling configuration
#[derive(Debug, Clone, Copy)]
pub struct PoolDescriptor {
    pub pool_type: PoolType,
    /// Kernel window [height, width]
    pub kernel: [i32; 2],
    /// Stride [height, width]
    pub stride: [i32; 2],
    /// Configured padding [height, width]; interpretation depends on pad mode
    pub pad: [i32; 2],
    pub pad_mode: PadMode,
    /// Pool over the entire spatial extent; overrides kernel/stride/pad
    pub global_pooling: bool,
}

impl PoolDescriptor {
    pub fn new(pool_type: PoolType, kernel: [i32; 2], stride: [i32; 2]) -> Self {
        PoolDescriptor {
            pool_type,
            kernel,
            stride,
            pad: [0, 0],
            pad_mode: PadMode::Explicit,
            global_pooling: false,
        }
    }

    pub fn with_pad(mut self, pad: [i32; 2]) -> Self {
        self.pad = pad;
        self
    }

    pub fn with_pad_mode(mut self, pad_mode: PadMode) -> Self {
        self.pad_mode = pad_mode;
        self
    }

    pub fn global(mut self) -> Self {
        self.global_pooling = true;
        self
    }
}

/// Pooling operator instance: owns its compiled kernel and plan
pub struct PoolExecution {
    device: Arc<dyn Accelerator>,
    name: String,
    pool_type: PoolType,
    kernels: [i32; 2],
    strides: [i32; 2],
    /// Stored doubled; the binder passes the leading half per dimension
    paddings: [i32; 2],
    pad_mode: PadMode,
    global_pooling: bool,
    plan: Option<OperatorPlan>,
}

impl PoolExecution {
    pub fn new(name: impl Into<String>, desc: &PoolDescriptor, device: Arc<dyn Accelerator>) -> Self {
        // Padding is distributed symmetrically: configured amounts count for
        // both sides, so they are stored doubled and halved at binding.
        let paddings = match desc.pad_mode {
            PadMode::Valid => [0, 0],
            _ => [desc.pad[0] * 2, desc.pad[1] * 2],
        };
        PoolExecution {
            device,
            name: name.into(),
            pool_type: desc.pool_type,
            kernels: desc.kernel,
            strides: desc.stride,
            paddings,
            pad_mode: desc.pad_mode,
            global_pooling: desc.global_pooling,
            plan: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current plan, if a resize has succeeded
    pub fn plan(&self) -> Option<&OperatorPlan> {
        self.plan.as_ref()
    }

    fn release_plan(&mut self) {
        if let Some(plan) = self.plan.take() {
            self.device.release_kernel(plan.kernel);
        }
    }
}

impl Execution for PoolExecution {
    fn resize(
        &mut self,
        inputs: &[Tensor],
        outputs: &[Tensor],
        tuner: &mut WorkGroupTuner,
    ) -> ClResult<()> {
        tracing::debug!("start pooling resize for '{}'", self.name);
        // A shape change invalidates the previous plan entirely; a failed
        // resize leaves the operator unusable until a later one succeeds.
        self.release_plan();

        let input = inputs.first().ok_or_else(|| {
            ClForgeError::Configuration("pooling requires one input tensor".to_string())
        })?;
        let output = outputs.first().ok_or_else(|| {
            ClForgeError::Configuration("pooling requires one output tensor".to_string())
        })?;

        let mut kernels = self.kernels;
        let mut strides = self.strides;
        let mut paddings = self.paddings;

        if self.global_pooling {
            kernels = input.shape.spatial();
            strides = input.shape.spatial();
            paddings = [0, 0];
        }

        if self.pad_mode == PadMode::Same {
            let input_spatial = input.shape.spatial();
            let output_spatial = output.shape.spatial();
            let pad_needed_height = std::cmp::max(
                0,
                (output_spatial[0] - 1) * strides[0] + kernels[0] - input_spatial[0],
            );
            let pad_needed_width = std::cmp::max(
                0,
                (output_spatial[1] - 1) * strides[1] + kernels[1] - input_spatial[1],
            );
            paddings = [pad_needed_height, pad_needed_width];
        }

        let channel_blocks = output.shape.channel_blocks() as i32;

        let mut build_options = Vec::new();
        if self.pool_type == PoolType::Average {
            build_options.push("-DPOOL_AVG".to_string());
        }
        let kernel = self
            .device
            .compile_kernel(PROGRAM_NAME, KERNEL_NAME, &build_options)?;

        let global = global_work_size(&output.shape);
        let work = match tuner.plan(self.device.as_ref(), kernel, PROGRAM_NAME, global) {
            Ok(work) => work,
            Err(err) => {
                self.device.release_kernel(kernel);
                return Err(err);
            }
        };

        let pad_before = [paddings[0] / 2, paddings[1] / 2];
        let args = [
            KernelArg::Uint(global[0]),
            KernelArg::Uint(global[1]),
            KernelArg::Uint(global[2]),
            KernelArg::Buffer(input.buffer),
            KernelArg::Int2(input.shape.spatial()),
            KernelArg::Int2(output.shape.spatial()),
            KernelArg::Int2(pad_before),
            KernelArg::Int2(strides),
            KernelArg::Int2(kernels),
            KernelArg::Buffer(output.buffer),
            KernelArg::Int(channel_blocks),
        ];
        if let Err(err) = self.device.set_kernel_args(kernel, &args) {
            self.device.release_kernel(kernel);
            return Err(err);
        }

        self.plan = Some(OperatorPlan {
            kernel,
            global: work.global,
            local: work.local,
            input_spatial: input.shape.spatial(),
            output_spatial: output.shape.spatial(),
            pad_before,
            stride: strides,
            kernel_window: kernels,
            channel_blocks,
        });
        tracing::debug!(
            "end pooling resize for '{}': global {:?}, local {:?}",
            self.name,
            work.global,
            work.local
        );
        Ok(())
    }

    fn execute(&mut self, profiling: &mut ProfilingSession) -> ClResult<()> {
        let plan = self.plan.as_ref().ok_or_else(|| {
            ClForgeError::Configuration(format!(
                "execute of '{}' before a successful resize",
                self.name
            ))
        })?;

        if profiling.is_enabled() {
            let event = self
                .device
                .enqueue_kernel(plan.kernel, plan.global, plan.local)?;
            let sample = ProfilingSample::collect(self.device.as_ref(), event)?;
            profiling.record(
                &self.name,
                &[sample.kernel_time, sample.enqueue_time, sample.submit_time],
            );
        } else {
            self.device
                .enqueue_kernel(plan.kernel, plan.global, plan.local)?;
        }
        Ok(())
    }
}

impl Drop for PoolExecution {
    fn drop(&mut self) {
        self.release_plan();
    }
}
