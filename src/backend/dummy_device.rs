//! Dummy accelerator for unit testing
//!
//! Host-only implementation of [`Accelerator`]: fake handles, no device
//! memory, and synthetic profiling timestamps driven by a configurable cost
//! model. Records every compile, argument binding, and launch so tests can
//! assert on the exact command sequence an operator issued.
//!
//! Fault-injection switches let tests exercise the failure paths (compile
//! failure at Resize, wait/query failure during profiling extraction)
//! without a real device.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::device::{
    Accelerator, BufferHandle, EventHandle, KernelArg, KernelHandle, ProfilePhase,
};
use crate::error::{ClForgeError, ClResult};

/// Synthetic kernel cost in nanoseconds, as a function of the launch sizes
pub type CostModel = Box<dyn Fn([u32; 3], Option<[u32; 3]>) -> u64 + Send + Sync>;

/// One recorded kernel submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchRecord {
    pub kernel: KernelHandle,
    pub global: [u32; 3],
    pub local: Option<[u32; 3]>,
}

#[derive(Debug, Clone)]
struct DummyKernel {
    program: String,
    kernel: String,
    build_options: Vec<String>,
    args: Option<Vec<KernelArg>>,
    released: bool,
}

#[derive(Debug, Clone, Copy)]
struct DummyEvent {
    queued: u64,
    submitted: u64,
    started: u64,
    ended: u64,
}

#[derive(Default)]
struct Inner {
    next_handle: u64,
    kernels: HashMap<u64, DummyKernel>,
    events: HashMap<u64, DummyEvent>,
    launches: Vec<LaunchRecord>,
    clock_ns: u64,
}

/// Host-only test device
pub struct DummyDevice {
    inner: Mutex<Inner>,
    max_work_group_size: u64,
    cost_model: CostModel,
    fail_compile: bool,
    fail_wait: bool,
    fail_timestamp: bool,
}

/// Fixed host→device latencies baked into synthetic timestamps
const ENQUEUE_LATENCY_NS: u64 = 250_000;
const DISPATCH_LATENCY_NS: u64 = 250_000;

impl DummyDevice {
    pub fn new() -> Self {
        DummyDevice {
            inner: Mutex::new(Inner::default()),
            max_work_group_size: 256,
            cost_model: Box::new(|_, _| 500_000),
            fail_compile: false,
            fail_wait: false,
            fail_timestamp: false,
        }
    }

    pub fn with_max_work_group_size(mut self, size: u64) -> Self {
        self.max_work_group_size = size;
        self
    }

    /// Replace the synthetic kernel cost model
    pub fn with_cost_model(
        mut self,
        model: impl Fn([u32; 3], Option<[u32; 3]>) -> u64 + Send + Sync + 'static,
    ) -> Self {
        self.cost_model = Box::new(model);
        self
    }

    pub fn failing_compile(mut self) -> Self {
        self.fail_compile = true;
        self
    }

    pub fn failing_wait(mut self) -> Self {
        self.fail_wait = true;
        self
    }

    pub fn failing_timestamp(mut self) -> Self {
        self.fail_timestamp = true;
        self
    }

    /// Hand out a fake buffer handle for tests
    pub fn fake_buffer(&self) -> BufferHandle {
        let mut inner = self.inner.lock().expect("dummy device lock");
        inner.next_handle += 1;
        BufferHandle::new(inner.next_handle)
    }

    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.inner.lock().expect("dummy device lock").launches.clone()
    }

    pub fn launch_count(&self) -> usize {
        self.inner.lock().expect("dummy device lock").launches.len()
    }

    /// Arguments currently bound to a kernel, if any
    pub fn bound_args(&self, kernel: KernelHandle) -> Option<Vec<KernelArg>> {
        let inner = self.inner.lock().expect("dummy device lock");
        inner.kernels.get(&kernel.raw()).and_then(|k| k.args.clone())
    }

    pub fn build_options(&self, kernel: KernelHandle) -> Option<Vec<String>> {
        let inner = self.inner.lock().expect("dummy device lock");
        inner
            .kernels
            .get(&kernel.raw())
            .map(|k| k.build_options.clone())
    }

    pub fn is_released(&self, kernel: KernelHandle) -> bool {
        let inner = self.inner.lock().expect("dummy device lock");
        inner
            .kernels
            .get(&kernel.raw())
            .map(|k| k.released)
            .unwrap_or(false)
    }

    pub fn compiled_kernel_count(&self) -> usize {
        self.inner.lock().expect("dummy device lock").kernels.len()
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        DummyDevice::new()
    }
}

impl Accelerator for DummyDevice {
    fn compile_kernel(
        &self,
        program: &str,
        kernel: &str,
        build_options: &[String],
    ) -> ClResult<KernelHandle> {
        if self.fail_compile {
            return Err(ClForgeError::Compile(format!(
                "build of '{}' in program '{}' failed",
                kernel, program
            )));
        }
        let mut inner = self.inner.lock().expect("dummy device lock");
        inner.next_handle += 1;
        let handle = inner.next_handle;
        inner.kernels.insert(
            handle,
            DummyKernel {
                program: program.to_string(),
                kernel: kernel.to_string(),
                build_options: build_options.to_vec(),
                args: None,
                released: false,
            },
        );
        Ok(KernelHandle::new(handle))
    }

    fn max_work_group_size(&self, kernel: KernelHandle) -> ClResult<u64> {
        let inner = self.inner.lock().expect("dummy device lock");
        if !inner.kernels.contains_key(&kernel.raw()) {
            return Err(ClForgeError::Configuration(format!(
                "work-group query on unknown kernel handle {}",
                kernel.raw()
            )));
        }
        Ok(self.max_work_group_size)
    }

    fn set_kernel_args(&self, kernel: KernelHandle, args: &[KernelArg]) -> ClResult<()> {
        let mut inner = self.inner.lock().expect("dummy device lock");
        match inner.kernels.get_mut(&kernel.raw()) {
            Some(k) if !k.released => {
                k.args = Some(args.to_vec());
                Ok(())
            }
            _ => Err(ClForgeError::Configuration(format!(
                "argument binding onto uncompiled kernel handle {}",
                kernel.raw()
            ))),
        }
    }

    fn enqueue_kernel(
        &self,
        kernel: KernelHandle,
        global: [u32; 3],
        local: Option<[u32; 3]>,
    ) -> ClResult<EventHandle> {
        let cost = (self.cost_model)(global, local);
        let mut inner = self.inner.lock().expect("dummy device lock");
        match inner.kernels.get(&kernel.raw()) {
            Some(k) if !k.released => {}
            _ => {
                return Err(ClForgeError::KernelLaunch(format!(
                    "enqueue of unknown kernel handle {}",
                    kernel.raw()
                )))
            }
        }
        let queued = inner.clock_ns;
        let submitted = queued + ENQUEUE_LATENCY_NS;
        let started = submitted + DISPATCH_LATENCY_NS;
        let ended = started + cost;
        inner.clock_ns = ended;
        inner.launches.push(LaunchRecord {
            kernel,
            global,
            local,
        });
        inner.next_handle += 1;
        let handle = inner.next_handle;
        inner.events.insert(
            handle,
            DummyEvent {
                queued,
                submitted,
                started,
                ended,
            },
        );
        Ok(EventHandle::new(handle))
    }

    fn wait(&self, event: EventHandle) -> ClResult<()> {
        if self.fail_wait {
            return Err(ClForgeError::DeviceWait(
                "simulated wait failure".to_string(),
            ));
        }
        let inner = self.inner.lock().expect("dummy device lock");
        if inner.events.contains_key(&event.raw()) {
            Ok(())
        } else {
            Err(ClForgeError::DeviceWait(format!(
                "wait on unknown event handle {}",
                event.raw()
            )))
        }
    }

    fn event_timestamp(&self, event: EventHandle, phase: ProfilePhase) -> ClResult<u64> {
        if self.fail_timestamp {
            return Err(ClForgeError::DeviceQuery(format!(
                "simulated timestamp query failure ({:?})",
                phase
            )));
        }
        let inner = self.inner.lock().expect("dummy device lock");
        let ev = inner.events.get(&event.raw()).ok_or_else(|| {
            ClForgeError::DeviceQuery(format!("timestamp query on unknown event {}", event.raw()))
        })?;
        Ok(match phase {
            ProfilePhase::Queued => ev.queued,
            ProfilePhase::Submitted => ev.submitted,
            ProfilePhase::Started => ev.started,
            ProfilePhase::Ended => ev.ended,
        })
    }

    fn release_kernel(&self, kernel: KernelHandle) {
        let mut inner = self.inner.lock().expect("dummy device lock");
        if let Some(k) = inner.kernels.get_mut(&kernel.raw()) {
            k.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> Vec<String> {
        vec!["-DPOOL_AVG".to_string()]
    }

    #[test]
    fn test_compile_records_program_and_options() {
        let device = DummyDevice::new();
        let kernel = device.compile_kernel("pooling_buf", "pooling", &opts()).unwrap();
        assert_eq!(device.build_options(kernel), Some(opts()));
        assert_eq!(device.compiled_kernel_count(), 1);
        let inner = device.inner.lock().unwrap();
        let k = inner.kernels.get(&kernel.raw()).unwrap();
        assert_eq!(k.program, "pooling_buf");
        assert_eq!(k.kernel, "pooling");
    }

    #[test]
    fn test_timestamps_are_non_decreasing() {
        let device = DummyDevice::new();
        let kernel = device.compile_kernel("pooling_buf", "pooling", &[]).unwrap();
        let event = device.enqueue_kernel(kernel, [8, 8, 4], None).unwrap();
        device.wait(event).unwrap();

        let queued = device.event_timestamp(event, ProfilePhase::Queued).unwrap();
        let submitted = device.event_timestamp(event, ProfilePhase::Submitted).unwrap();
        let started = device.event_timestamp(event, ProfilePhase::Started).unwrap();
        let ended = device.event_timestamp(event, ProfilePhase::Ended).unwrap();
        assert!(queued <= submitted && submitted <= started && started <= ended);
    }

    #[test]
    fn test_cost_model_drives_kernel_interval() {
        let device = DummyDevice::new().with_cost_model(|_, _| 5_000_000);
        let kernel = device.compile_kernel("pooling_buf", "pooling", &[]).unwrap();
        let event = device.enqueue_kernel(kernel, [1, 1, 1], None).unwrap();
        let started = device.event_timestamp(event, ProfilePhase::Started).unwrap();
        let ended = device.event_timestamp(event, ProfilePhase::Ended).unwrap();
        assert_eq!(ended - started, 5_000_000);
    }

    #[test]
    fn test_args_on_unknown_handle_fail() {
        let device = DummyDevice::new();
        let err = device
            .set_kernel_args(KernelHandle::new(999), &[KernelArg::Int(1)])
            .unwrap_err();
        assert!(matches!(err, ClForgeError::Configuration(_)));
    }

    #[test]
    fn test_release_then_enqueue_fails() {
        let device = DummyDevice::new();
        let kernel = device.compile_kernel("pooling_buf", "pooling", &[]).unwrap();
        device.release_kernel(kernel);
        assert!(device.is_released(kernel));
        let err = device.enqueue_kernel(kernel, [1, 1, 1], None).unwrap_err();
        assert!(matches!(err, ClForgeError::KernelLaunch(_)));
    }

    #[test]
    fn test_fault_injection() {
        let device = DummyDevice::new().failing_compile();
        assert!(matches!(
            device.compile_kernel("p", "k", &[]).unwrap_err(),
            ClForgeError::Compile(_)
        ));

        let device = DummyDevice::new().failing_wait();
        let kernel = device.compile_kernel("p", "k", &[]).unwrap();
        let event = device.enqueue_kernel(kernel, [1, 1, 1], None).unwrap();
        assert!(matches!(
            device.wait(event).unwrap_err(),
            ClForgeError::DeviceWait(_)
        ));

        let device = DummyDevice::new().failing_timestamp();
        let kernel = device.compile_kernel("p", "k", &[]).unwrap();
        let event = device.enqueue_kernel(kernel, [1, 1, 1], None).unwrap();
        assert!(matches!(
            device.event_timestamp(event, ProfilePhase::Queued).unwrap_err(),
            ClForgeError::DeviceQuery(_)
        ));
    }
}
