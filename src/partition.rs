//! Partitioning of the flat id space across processing elements.
//!
//! Every PE gets one contiguous range of identical size. The ranges tile
//! `[0, total)` in PE order. A total that does not divide evenly is rejected
//! with `PartitionMismatch` instead of dropping the remainder.

use serde::Serialize;
use std::ops::Range;

use crate::address::FlatId;
use crate::error::MappingError;

/// The contiguous range of flat ids owned by one processing element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub pe_index: u64,
    /// First flat id owned by this PE
    pub base: FlatId,
    /// Number of ids owned by this PE
    pub size: u64,
}

impl Partition {
    /// One past the last owned id
    /// One past the last id, saturating at `u64::MAX`
    pub fn end(&self) -> FlatId {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, flat_id: FlatId) -> bool {
        flat_id >= self.base && flat_id - self.base < self.size
    }

    pub fn ids(&self) -> Range<FlatId> {
        self.base..self.end()
    }
}

/// Entities per PE, failing when `total` does not split evenly
pub fn entities_per_pe(total: u64, num_pes: u64) -> Result<u64, MappingError> {
    if num_pes == 0 {
        return Err(MappingError::InvalidTopology(
            "at least one processing element is required".to_string(),
        ));
    }
    if total % num_pes != 0 {
        return Err(MappingError::PartitionMismatch { total, num_pes });
    }
    Ok(total / num_pes)
}

/// Partitions for every PE, in PE order
pub fn plan_partitions(total: u64, num_pes: u64) -> Result<Vec<Partition>, MappingError> {
    let size = entities_per_pe(total, num_pes)?;
    Ok((0..num_pes)
        .map(|pe_index| Partition {
            pe_index,
            base: pe_index * size,
            size,
        })
        .collect())
}

/// Partition owned by `pe_index`
pub fn local_partition(total: u64, num_pes: u64, pe_index: u64) -> Result<Partition, MappingError> {
    let size = entities_per_pe(total, num_pes)?;
    if pe_index >= num_pes {
        return Err(MappingError::InvalidTopology(format!(
            "PE index {} is not below PE count {}",
            pe_index, num_pes
        )));
    }

    let partition = Partition {
        pe_index,
        base: pe_index * size,
        size,
    };
    log::info!(
        "PE {} of {} owns flat ids [{}, {}) of {}",
        pe_index,
        num_pes,
        partition.base,
        partition.end(),
        total
    );
    Ok(partition)
}

/// PE that owns `flat_id`
pub fn owner_pe(flat_id: FlatId, total: u64, num_pes: u64) -> Result<u64, MappingError> {
    let size = entities_per_pe(total, num_pes)?;
    if flat_id >= total {
        return Err(MappingError::out_of_range("flat id", flat_id, total));
    }
    Ok(flat_id / size)
}
