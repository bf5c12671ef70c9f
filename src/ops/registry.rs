//! Operator dispatch table
//!
//! Maps an (operator kind, memory layout) key to a factory producing an
//! [`Execution`] instance. The table is built and populated once at backend
//! initialization and only queried afterwards — no self-registering globals.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::Accelerator;
use crate::error::{ClForgeError, ClResult};
use crate::ops::execution::Execution;
use crate::ops::pool::{PoolDescriptor, PoolExecution};
use crate::tensor::MemoryLayout;

/// Operator type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Pooling,
}

/// Kind-specific operator parameters
#[derive(Debug, Clone, Copy)]
pub enum OpParams {
    Pool(PoolDescriptor),
}

/// Everything a factory needs to build one operator instance
#[derive(Debug, Clone)]
pub struct OpDescriptor {
    pub name: String,
    pub params: OpParams,
}

impl OpDescriptor {
    pub fn new(name: impl Into<String>, params: OpParams) -> Self {
        OpDescriptor {
            name: name.into(),
            params,
        }
    }
}

/// Factory producing an execution lifecycle instance for one operator kind
pub type ExecutionFactory =
    Box<dyn Fn(&OpDescriptor, Arc<dyn Accelerator>) -> ClResult<Box<dyn Execution>> + Send + Sync>;

/// Dispatch table from (operator kind, memory layout) to factory
pub struct ExecutionRegistry {
    factories: HashMap<(OpKind, MemoryLayout), ExecutionFactory>,
}

impl ExecutionRegistry {
    /// Build the table with the built-in operators registered
    pub fn new() -> Self {
        let mut registry = ExecutionRegistry {
            factories: HashMap::new(),
        };
        registry.register(
            OpKind::Pooling,
            MemoryLayout::Buffer,
            Box::new(|desc, device| {
                let OpParams::Pool(pool) = &desc.params;
                Ok(Box::new(PoolExecution::new(desc.name.as_str(), pool, device)))
            }),
        );
        registry
    }

    /// Register or replace the factory for a key
    pub fn register(&mut self, kind: OpKind, layout: MemoryLayout, factory: ExecutionFactory) {
        self.factories.insert((kind, layout), factory);
    }

    pub fn supports(&self, kind: OpKind, layout: MemoryLayout) -> bool {
        self.factories.contains_key(&(kind, layout))
    }

    /// Produce an operator instance for the key, or fail with
    /// `UnsupportedOperator` if nothing is registered for it
    pub fn create(
        &self,
        kind: OpKind,
        layout: MemoryLayout,
        desc: &OpDescriptor,
        device: Arc<dyn Accelerator>,
    ) -> ClResult<Box<dyn Execution>> {
        let factory = self.factories.get(&(kind, layout)).ok_or_else(|| {
            ClForgeError::UnsupportedOperator(format!("{:?} on {:?} layout", kind, layout))
        })?;
        factory(desc, device)
    }
}

impl Default for ExecutionRegistry {
    fn default() -> Self {
        ExecutionRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyDevice;
    use crate::ops::pool::PoolType;

    fn pool_desc() -> OpDescriptor {
        OpDescriptor::new(
            "pool0",
            OpParams::Pool(PoolDescriptor::new(PoolType::Max, [2, 2], [2, 2])),
        )
    }

    #[test]
    fn test_builtin_pooling_buffer_is_registered() {
        let registry = ExecutionRegistry::new();
        assert!(registry.supports(OpKind::Pooling, MemoryLayout::Buffer));
        assert!(!registry.supports(OpKind::Pooling, MemoryLayout::Image));
    }

    #[test]
    fn test_create_pooling_instance() {
        let registry = ExecutionRegistry::new();
        let device = Arc::new(DummyDevice::new());
        let execution = registry.create(
            OpKind::Pooling,
            MemoryLayout::Buffer,
            &pool_desc(),
            device,
        );
        assert!(execution.is_ok());
    }

    #[test]
    fn test_unknown_key_is_unsupported_operator() {
        let registry = ExecutionRegistry::new();
        let device = Arc::new(DummyDevice::new());
        let err = registry
            .create(OpKind::Pooling, MemoryLayout::Image, &pool_desc(), device)
            .unwrap_err();
        assert!(matches!(err, ClForgeError::UnsupportedOperator(_)));
    }
}
