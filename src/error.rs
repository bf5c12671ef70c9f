//! Unified error handling for clforge
//!
//! Every fallible phase (Resize, Execute, profiling extraction) propagates a
//! `ClForgeError` synchronously to its caller. Configuration and compile
//! failures leave the operator unusable until the next successful Resize;
//! device failures are fatal for the invocation they occurred in and are
//! never retried — a lost device event cannot be recovered by retrying.

use std::fmt;

/// Unified error type for clforge
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClForgeError {
    /// Invalid configuration: zero max work-group size, binding onto an
    /// uncompiled kernel, executing before a successful Resize, unsupported
    /// pad-mode combination.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Kernel source/build failure at Resize time
    #[error("kernel compilation failed: {0}")]
    Compile(String),

    /// The accelerator refused or failed a timestamp query
    #[error("device query failed: {0}")]
    DeviceQuery(String),

    /// The accelerator refused or failed a completion wait
    #[error("device wait failed: {0}")]
    DeviceWait(String),

    /// Kernel submission onto the command stream failed
    #[error("kernel launch failed: {0}")]
    KernelLaunch(String),

    /// No factory registered for the requested (operator kind, layout) key
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
}

impl ClForgeError {
    /// Categorize the error for handling decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClForgeError::Configuration(_) | ClForgeError::UnsupportedOperator(_) => {
                ErrorCategory::Configuration
            }
            ClForgeError::Compile(_) => ErrorCategory::Compile,
            ClForgeError::DeviceQuery(_)
            | ClForgeError::DeviceWait(_)
            | ClForgeError::KernelLaunch(_) => ErrorCategory::Device,
        }
    }

    /// Setup errors abort Resize and leave the operator unusable
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Compile
        )
    }

    /// Device errors are fatal for one invocation and must not be retried
    pub fn is_device_error(&self) -> bool {
        self.category() == ErrorCategory::Device
    }
}

/// Error category for handling decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid operator or planner configuration
    Configuration,
    /// Kernel build failure
    Compile,
    /// Accelerator query/wait/launch failure
    Device,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "Configuration"),
            ErrorCategory::Compile => write!(f, "Compile"),
            ErrorCategory::Device => write!(f, "Device"),
        }
    }
}

/// Result alias used throughout the crate
pub type ClResult<T> = std::result::Result<T, ClForgeError>;
