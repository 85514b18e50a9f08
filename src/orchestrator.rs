//! Startup orchestration.
//!
//! [`MappingContext`] is built once per PE from the configuration and the
//! PE topology, and is the only state this crate keeps after initialization.
//! It owns the address space, the local partition and the kernel process map,
//! and answers every lookup model code needs at runtime.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::info;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::address::{AddressSpace, FlatId, StructuredIdentity};
use crate::config::Config;
use crate::error::MappingError;
use crate::layout::Layout;
use crate::partition::{self, Partition};
use crate::placement::{
    self, EntityRegistrar, KernelProcessMap, PlacementRecord, PlacementSummary, PlacementTable,
};

/// Position of this process in the distributed execution environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeTopology {
    pub num_pes: u64,
    pub pe_index: u64,
}

/// Entity count of one (group, type) pair across all repetitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub group_name: String,
    pub type_name: String,
    pub count: u64,
}

/// Immutable per-PE addressing context
#[derive(Debug, Clone)]
pub struct MappingContext {
    space: AddressSpace,
    partition: Partition,
    num_pes: u64,
    kernels: KernelProcessMap,
}

impl MappingContext {
    /// Build the address space and carve out this PE's partition
    pub fn new(layout: Layout, topology: PeTopology, kernels: KernelProcessMap) -> Result<Self> {
        let space = AddressSpace::new(layout).wrap_err("Layout is not addressable")?;
        let total = space.total_entities();
        let partition = partition::local_partition(total, topology.num_pes, topology.pe_index)
            .wrap_err("Failed to partition the entity space")?;

        info!(
            "Address space: {} entities in {} groups, {} per PE",
            total,
            space.layout().groups.len(),
            partition.size
        );

        Ok(Self {
            space,
            partition,
            num_pes: topology.num_pes,
            kernels,
        })
    }

    /// Build a context from a loaded configuration
    pub fn from_config(config: &Config, topology: PeTopology) -> Result<Self> {
        let kernels = KernelProcessMap::new(
            config.general.kernel_processes_per_pe,
            config.general.workers_per_pe,
        )?;
        Self::new(config.layout.clone(), topology, kernels)
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn kernels(&self) -> &KernelProcessMap {
        &self.kernels
    }

    pub fn num_pes(&self) -> u64 {
        self.num_pes
    }

    pub fn total_entities(&self) -> u64 {
        self.space.total_entities()
    }

    pub fn entities_per_pe(&self) -> u64 {
        self.partition.size
    }

    pub fn to_flat_id(
        &self,
        group_name: &str,
        type_name: &str,
        repetition_id: u64,
        offset: u64,
    ) -> Result<FlatId, MappingError> {
        self.space
            .to_flat_id(group_name, type_name, repetition_id, offset)
    }

    pub fn to_structured_identity(&self, flat_id: FlatId) -> Result<StructuredIdentity, MappingError> {
        self.space.to_structured_identity(flat_id)
    }

    /// Local index of an id owned by this PE
    pub fn resolve_local(&self, flat_id: FlatId) -> Result<u64, MappingError> {
        placement::resolve_local(flat_id, &self.partition)
    }

    /// PE owning any id in the global space
    pub fn owner_pe(&self, flat_id: FlatId) -> Result<u64, MappingError> {
        partition::owner_pe(flat_id, self.total_entities(), self.num_pes)
    }

    pub fn is_local(&self, flat_id: FlatId) -> bool {
        self.partition.contains(flat_id)
    }

    /// Register this PE's entities with the host scheduler
    pub fn initialize_local_entities<R>(&self, registrar: &mut R) -> Result<PlacementSummary, MappingError>
    where
        R: EntityRegistrar + ?Sized,
    {
        placement::initialize_local_entities(&self.space, &self.partition, &self.kernels, registrar)
    }

    /// Global entity count for every (group, type) pair, in declaration order
    pub fn entity_count_by_type(&self) -> Vec<TypeCount> {
        self.space
            .layout()
            .groups
            .iter()
            .flat_map(|group| {
                group.types.iter().map(move |ty| TypeCount {
                    group_name: group.name.clone(),
                    type_name: ty.name.clone(),
                    count: ty.count * group.repetitions,
                })
            })
            .collect()
    }

    /// Check that every id in the global space round-trips through both
    /// directions of the mapping. Returns the number of ids checked.
    pub fn verify_address_space(&self) -> Result<u64> {
        let total = self.total_entities();
        (0..total).into_par_iter().try_for_each(|flat_id| -> Result<()> {
            let identity = self.space.to_structured_identity(flat_id)?;
            let back = self.space.to_flat_id(
                &identity.group_name,
                &identity.type_name,
                identity.repetition_id,
                identity.offset,
            )?;
            if back != flat_id {
                return Err(eyre!("flat id {} round-trips to {}", flat_id, back));
            }
            Ok(())
        })?;
        info!("Verified {} flat ids round-trip", total);
        Ok(total)
    }
}

/// Serialized view of one PE's placement
#[derive(Serialize, Debug)]
pub struct PlacementPlan {
    pub topology: PeTopology,
    pub total_entities: u64,
    pub partition: Partition,
    pub kernels: KernelProcessMap,
    pub type_counts: Vec<TypeCount>,
    pub summary: PlacementSummary,
    /// Type name for each type handle
    pub type_names: Vec<String>,
    pub entities: Vec<PlacementRecord>,
}

/// Run placement into an in-memory table and package the result
pub fn build_placement_plan(context: &MappingContext) -> Result<PlacementPlan> {
    let mut table = PlacementTable::new();
    let summary = context
        .initialize_local_entities(&mut table)
        .wrap_err("Entity placement failed")?;

    Ok(PlacementPlan {
        topology: PeTopology {
            num_pes: context.num_pes(),
            pe_index: context.partition().pe_index,
        },
        total_entities: context.total_entities(),
        partition: *context.partition(),
        kernels: *context.kernels(),
        type_counts: context.entity_count_by_type(),
        summary,
        type_names: table.type_names,
        entities: table.records,
    })
}

/// Write a placement plan as pretty-printed JSON
pub fn write_placement_plan(plan: &PlacementPlan, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    std::fs::write(output_path, json)
        .wrap_err_with(|| format!("Failed to write placement plan '{}'", output_path.display()))?;
    info!("Wrote placement plan to {:?}", output_path);
    Ok(())
}
