//! Local entity initialization and local index resolution.

use log::{debug, info};
use serde::Serialize;

use super::registrar::EntityRegistrar;
use super::types::{KernelProcessMap, Placement};
use crate::address::{AddressSpace, FlatId};
use crate::error::MappingError;
use crate::partition::Partition;

/// Outcome of placing one PE's entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementSummary {
    pub placed: u64,
    /// Number of entities on each kernel process that received any. Only the
    /// first `min(K, placed)` kernel processes can, so that is the length.
    pub per_kernel_process: Vec<u64>,
}

/// Resolve, assign and register every entity in `partition`.
///
/// For each flat id in the partition, in increasing order: the local index is
/// `flat_id - partition.base`, the kernel process is `local_index mod K`, and
/// the worker is `kernel_process mod W`. Stops at the first registrar error.
pub fn initialize_local_entities<R>(
    space: &AddressSpace,
    partition: &Partition,
    kernels: &KernelProcessMap,
    registrar: &mut R,
) -> Result<PlacementSummary, MappingError>
where
    R: EntityRegistrar + ?Sized,
{
    // base + size may overflow for a hand-built partition
    let total = space.total_entities();
    if partition.base > total {
        return Err(MappingError::out_of_range(
            "partition base",
            partition.base,
            total.saturating_add(1),
        ));
    }
    let room = total - partition.base;
    if partition.size > room {
        return Err(MappingError::out_of_range(
            "partition size",
            partition.size,
            room.saturating_add(1),
        ));
    }

    let mut per_kernel_process: Vec<u64> = Vec::new();
    for flat_id in partition.ids() {
        let local_index = flat_id - partition.base;
        let identity = space.to_structured_identity(flat_id)?;
        let kernel_process_id = kernels.kernel_process_for(local_index);
        let placement = Placement {
            flat_id,
            local_index,
            kernel_process_id,
            worker_id: kernels.worker_for(kernel_process_id),
            identity,
        };

        debug!(
            "Entity {} (local {}) -> {}/{}[{}].{} on KP {}",
            flat_id,
            local_index,
            placement.identity.group_name,
            placement.identity.type_name,
            placement.identity.repetition_id,
            placement.identity.offset,
            kernel_process_id
        );

        registrar
            .register(&placement)
            .map_err(|reason| MappingError::Registration {
                local_index,
                reason,
            })?;

        // Kernel process ids rise by one until they wrap to 0
        let slot = kernel_process_id as usize;
        if slot >= per_kernel_process.len() {
            per_kernel_process.resize(slot + 1, 0);
        }
        per_kernel_process[slot] += 1;
    }

    info!(
        "Placed {} entities on PE {} across {} of {} kernel processes",
        partition.size,
        partition.pe_index,
        per_kernel_process.len(),
        kernels.kernel_processes()
    );

    Ok(PlacementSummary {
        placed: partition.size,
        per_kernel_process,
    })
}

/// Local index of a flat id owned by this PE.
///
/// Ids owned by other PEs must only be addressed symbolically; asking for
/// their local index is a `RangeViolation`.
pub fn resolve_local(flat_id: FlatId, partition: &Partition) -> Result<u64, MappingError> {
    if !partition.contains(flat_id) {
        return Err(MappingError::outside(
            "local flat id",
            flat_id,
            partition.base,
            partition.end(),
        ));
    }
    Ok(flat_id - partition.base)
}
