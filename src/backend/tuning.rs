//! Kernel work partitioning and work-group auto-tuning
//!
//! The planner maps an operator's output iteration space onto an exact 3D
//! global work size and selects a local (work-group) size for it. Local-size
//! candidates always divide the global size evenly per dimension and respect
//! the device-reported maximum work-group size for the compiled kernel.
//!
//! When trial measurement is enabled the tuner submits each candidate
//! sequentially (every trial's completion is awaited before the next is
//! issued, so timings stay comparable) and keeps the one with the lowest
//! measured kernel time. Without trials a deterministic greedy partition is
//! used. Tuned results are cached per (kernel name, global size).

use std::collections::HashMap;

use crate::backend::device::{Accelerator, KernelHandle};
use crate::error::{ClForgeError, ClResult};
use crate::profiling::ProfilingSample;
use crate::tensor::TensorShape;

/// Upper bound on trial submissions per tuning search
const MAX_TRIAL_CANDIDATES: usize = 16;

/// Work partitioning for one planned kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPlan {
    /// Total invocation units, one per output element group. Exact — never
    /// padded or rounded.
    pub global: [u32; 3],
    /// Work-group size; `None` leaves partitioning to the device
    pub local: Option<[u32; 3]>,
}

/// Global work size for a pooling-style output iteration space:
/// (output_width, batch × output_height, channel_blocks).
pub fn global_work_size(output: &TensorShape) -> [u32; 3] {
    [
        output.width,
        output.batch * output.height,
        output.channel_blocks(),
    ]
}

/// Work-group size selector with a per-(kernel, global size) tuning cache
pub struct WorkGroupTuner {
    trials_enabled: bool,
    tuned: HashMap<(String, [u32; 3]), [u32; 3]>,
}

impl WorkGroupTuner {
    /// Tuner that uses the default heuristic partition (no trial launches)
    pub fn new() -> Self {
        WorkGroupTuner {
            trials_enabled: false,
            tuned: HashMap::new(),
        }
    }

    /// Tuner that measures divisor candidates with trial submissions
    pub fn with_trials() -> Self {
        WorkGroupTuner {
            trials_enabled: true,
            tuned: HashMap::new(),
        }
    }

    /// Plan the work partitioning for one compiled kernel.
    ///
    /// Queries the device's maximum work-group size for the kernel; a
    /// reported size of zero is a configuration error and execution must not
    /// proceed.
    pub fn plan(
        &mut self,
        device: &dyn Accelerator,
        kernel: KernelHandle,
        kernel_name: &str,
        global: [u32; 3],
    ) -> ClResult<WorkPlan> {
        let max_wgs = device.max_work_group_size(kernel)?;
        if max_wgs == 0 {
            return Err(ClForgeError::Configuration(format!(
                "device reported max work-group size 0 for kernel '{}'",
                kernel_name
            )));
        }

        let cache_key = (kernel_name.to_string(), global);
        if let Some(&local) = self.tuned.get(&cache_key) {
            tracing::trace!(
                "tuner cache hit for '{}' global {:?}: local {:?}",
                kernel_name,
                global,
                local
            );
            return Ok(WorkPlan {
                global,
                local: Some(local),
            });
        }

        let local = if self.trials_enabled {
            let candidates = candidate_local_sizes(global, max_wgs);
            match self.measure_candidates(device, kernel, global, &candidates)? {
                Some(best) => best,
                None => default_local_size(global, max_wgs),
            }
        } else {
            default_local_size(global, max_wgs)
        };

        tracing::debug!(
            "planned '{}': global {:?}, local {:?} (max wgs {})",
            kernel_name,
            global,
            local,
            max_wgs
        );
        self.tuned.insert(cache_key, local);
        Ok(WorkPlan {
            global,
            local: Some(local),
        })
    }

    /// Run each candidate once and keep the cheapest. Trials are strictly
    /// sequential; every completion is awaited before the next submission.
    fn measure_candidates(
        &self,
        device: &dyn Accelerator,
        kernel: KernelHandle,
        global: [u32; 3],
        candidates: &[[u32; 3]],
    ) -> ClResult<Option<[u32; 3]>> {
        let mut best: Option<([u32; 3], f64)> = None;
        for &candidate in candidates {
            let event = device.enqueue_kernel(kernel, global, Some(candidate))?;
            let sample = ProfilingSample::collect(device, event)?;
            tracing::trace!(
                "trial local {:?}: kernel_time {:.3} ms",
                candidate,
                sample.kernel_time
            );
            match best {
                Some((_, cost)) if cost <= sample.kernel_time => {}
                _ => best = Some((candidate, sample.kernel_time)),
            }
        }
        Ok(best.map(|(local, _)| local))
    }
}

impl Default for WorkGroupTuner {
    fn default() -> Self {
        WorkGroupTuner::new()
    }
}

/// All divisors of `n` in ascending order
fn divisors(n: u32) -> Vec<u32> {
    (1..=n).filter(|d| n % d == 0).collect()
}

/// Divisor candidates for a 3D global size: every (x, y, 1) pair of
/// per-dimension divisors whose product fits the device maximum, largest
/// volumes first, capped to a small set.
fn candidate_local_sizes(global: [u32; 3], max_wgs: u64) -> Vec<[u32; 3]> {
    let mut candidates = Vec::new();
    for &lx in &divisors(global[0]) {
        for &ly in &divisors(global[1]) {
            if u64::from(lx) * u64::from(ly) <= max_wgs {
                candidates.push([lx, ly, 1]);
            }
        }
    }
    candidates.sort_by(|a, b| {
        let va = a[0] * a[1] * a[2];
        let vb = b[0] * b[1] * b[2];
        vb.cmp(&va).then(b[0].cmp(&a[0]))
    });
    candidates.truncate(MAX_TRIAL_CANDIDATES);
    candidates
}

/// Greedy fallback partition: the largest even divisor per dimension, in
/// x → y → z order, that still fits the device maximum.
fn default_local_size(global: [u32; 3], max_wgs: u64) -> [u32; 3] {
    let lx = *divisors(global[0])
        .iter()
        .rev()
        .find(|&&d| u64::from(d) <= max_wgs)
        .unwrap_or(&1);
    let ly = *divisors(global[1])
        .iter()
        .rev()
        .find(|&&d| u64::from(lx) * u64::from(d) <= max_wgs)
        .unwrap_or(&1);
    let lz = *divisors(global[2])
        .iter()
        .rev()
        .find(|&&d| u64::from(lx) * u64::from(ly) * u64::from(d) <= max_wgs)
        .unwrap_or(&1);
    [lx, ly, lz]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy_device::DummyDevice;

    fn compile(device: &DummyDevice) -> KernelHandle {
        device
            .compile_kernel("pooling_buf", "pooling", &[])
            .expect("compile")
    }

    #[test]
    fn test_global_work_size_layout() {
        let output = TensorShape::new(2, 3, 5, 9);
        // (width, batch * height, channel blocks)
        assert_eq!(global_work_size(&output), [5, 6, 3]);
    }

    #[test]
    fn test_candidates_divide_evenly_and_fit() {
        let global = [8, 6, 4];
        for candidate in candidate_local_sizes(global, 64) {
            assert_eq!(global[0] % candidate[0], 0);
            assert_eq!(global[1] % candidate[1], 0);
            assert_eq!(global[2] % candidate[2], 0);
            let volume = u64::from(candidate[0]) * u64::from(candidate[1]) * u64::from(candidate[2]);
            assert!(volume <= 64);
        }
    }

    #[test]
    fn test_candidate_set_is_small() {
        let candidates = candidate_local_sizes([64, 128, 16], 256);
        assert!(candidates.len() <= MAX_TRIAL_CANDIDATES);
        assert!(!candidates.is_empty());
    }

    #[test]
    fn test_default_partition_divides_evenly() {
        let global = [12, 10, 4];
        let local = default_local_size(global, 64);
        assert_eq!(global[0] % local[0], 0);
        assert_eq!(global[1] % local[1], 0);
        assert_eq!(global[2] % local[2], 0);
        let volume = u64::from(local[0]) * u64::from(local[1]) * u64::from(local[2]);
        assert!(volume <= 64);
        // greedy x-first: 12 fits entirely
        assert_eq!(local[0], 12);
    }

    #[test]
    fn test_zero_max_work_group_size_is_configuration_error() {
        let device = DummyDevice::new().with_max_work_group_size(0);
        let kernel = compile(&device);
        let mut tuner = WorkGroupTuner::new();
        let err = tuner
            .plan(&device, kernel, "pooling_buf", [4, 4, 1])
            .unwrap_err();
        assert!(matches!(err, ClForgeError::Configuration(_)));
    }

    #[test]
    fn test_heuristic_plan_issues_no_launches() {
        let device = DummyDevice::new();
        let kernel = compile(&device);
        let mut tuner = WorkGroupTuner::new();
        let plan = tuner.plan(&device, kernel, "pooling_buf", [8, 4, 2]).unwrap();
        assert_eq!(plan.global, [8, 4, 2]);
        assert!(plan.local.is_some());
        assert_eq!(device.launch_count(), 0);
    }

    #[test]
    fn test_measured_tuning_picks_cheapest_candidate() {
        // Cost model strongly favors local size [2, 2, 1].
        let device = DummyDevice::new().with_cost_model(|_, local| match local {
            Some([2, 2, 1]) => 10_000,
            _ => 900_000,
        });
        let kernel = compile(&device);
        let mut tuner = WorkGroupTuner::with_trials();
        let plan = tuner.plan(&device, kernel, "pooling_buf", [4, 4, 1]).unwrap();
        assert_eq!(plan.local, Some([2, 2, 1]));
        assert!(device.launch_count() > 1);
    }

    #[test]
    fn test_tuning_cache_skips_repeat_trials() {
        let device = DummyDevice::new();
        let kernel = compile(&device);
        let mut tuner = WorkGroupTuner::with_trials();
        let first = tuner.plan(&device, kernel, "pooling_buf", [4, 4, 1]).unwrap();
        let launches_after_first = device.launch_count();
        assert!(launches_after_first > 0);

        let second = tuner.plan(&device, kernel, "pooling_buf", [4, 4, 1]).unwrap();
        assert_eq!(first, second);
        assert_eq!(device.launch_count(), launches_after_first);
    }
}
