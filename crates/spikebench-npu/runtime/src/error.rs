// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for engine operations

/// Runtime errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// A lifecycle call arrived in the wrong state
    #[error("Invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Device (or host) memory could not be reserved
    #[error("Out of memory: requested {requested_bytes} bytes (limit {limit_bytes:?})")]
    OutOfMemory {
        /// Requested bytes
        requested_bytes: usize,
        /// Configured limit, if any
        limit_bytes: Option<usize>,
    },

    /// Population handle not present in the allocated network
    #[error("Unknown population handle {0}")]
    UnknownPopulation(u32),

    /// Network cannot be executed by this engine
    #[error("Unsupported network: {0}")]
    Unsupported(String),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Result type for runtime operations
pub type Result<T> = core::result::Result<T, RuntimeError>;
