//! Placement type definitions.

use serde::Serialize;

use crate::address::{FlatId, StructuredIdentity};
use crate::error::MappingError;

/// Dense handle the host scheduler uses for an entity type
pub type TypeHandle = usize;

/// Everything the driver computes for one local entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub flat_id: FlatId,
    /// `flat_id - partition.base`
    pub local_index: u64,
    pub kernel_process_id: u64,
    pub worker_id: u64,
    pub identity: StructuredIdentity,
}

/// A placement after the host has bound its type to a handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementRecord {
    pub flat_id: FlatId,
    pub local_index: u64,
    pub kernel_process_id: u64,
    pub worker_id: u64,
    pub type_handle: TypeHandle,
    pub identity: StructuredIdentity,
}

/// Fixed round-robin assignment of entities to kernel processes and of
/// kernel processes to workers.
///
/// Depends only on the two counts, so every PE configured with the same
/// counts computes the same assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KernelProcessMap {
    kernel_processes: u64,
    workers: u64,
}

impl KernelProcessMap {
    pub fn new(kernel_processes: u64, workers: u64) -> Result<Self, MappingError> {
        if kernel_processes == 0 {
            return Err(MappingError::InvalidTopology(
                "at least one kernel process per PE is required".to_string(),
            ));
        }
        if workers == 0 {
            return Err(MappingError::InvalidTopology(
                "at least one worker per PE is required".to_string(),
            ));
        }
        Ok(Self {
            kernel_processes,
            workers,
        })
    }

    pub fn kernel_processes(&self) -> u64 {
        self.kernel_processes
    }

    pub fn workers(&self) -> u64 {
        self.workers
    }

    /// Kernel process that schedules the entity at `local_index`
    pub fn kernel_process_for(&self, local_index: u64) -> u64 {
        local_index % self.kernel_processes
    }

    /// Worker that runs `kernel_process_id`
    pub fn worker_for(&self, kernel_process_id: u64) -> u64 {
        kernel_process_id % self.workers
    }
}
