//! Accelerator-backed operators

pub mod execution;
pub mod pool;
pub mod registry;

pub use execution::{Execution, OperatorPlan};
pub use pool::{PadMode, PoolDescriptor, PoolExecution, PoolType};
pub use registry::{ExecutionFactory, ExecutionRegistry, OpDescriptor, OpKind, OpParams};
