//! Placement of local entities onto the host scheduler.
//!
//! Each PE walks its own partition of the flat id space once at startup,
//! resolves every id to its structured identity, picks a kernel process by
//! round-robin over the local index, and hands the result to an
//! [`EntityRegistrar`]. The registrar is the only seam to the host scheduler.

pub mod driver;
pub mod registrar;
pub mod types;

pub use driver::{initialize_local_entities, resolve_local, PlacementSummary};
pub use registrar::{EntityRegistrar, PlacementTable};
pub use types::{KernelProcessMap, Placement, PlacementRecord, TypeHandle};
