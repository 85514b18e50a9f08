//! # lpmap - Entity placement and global addressing for parallel discrete-event simulations
//!
//! This library gives every simulated entity a single global integer address
//! (a *flat id*), splits the id space evenly across processing elements (PEs),
//! and registers each PE's share with the host scheduler.
//!
//! ## Overview
//!
//! Entity populations are described hierarchically: named groups, each
//! repeated some number of times, each holding an ordered list of named
//! types with instance counts. Every PE reads the same description and
//! computes the same global layout on its own, with no coordination. Only
//! the placement step differs between PEs: each one touches its own
//! contiguous slice of the id space.
//!
//! ## Architecture
//!
//! - `layout`: groups, types, counts and their validation
//! - `config`: YAML document model and typed key/value access
//! - `config_loader`: configuration file loading
//! - `address`: flat id <-> (group, type, repetition, offset)
//! - `partition`: equal contiguous partitions per PE
//! - `placement`: local entity registration with the host scheduler
//! - `orchestrator`: the per-PE [`orchestrator::MappingContext`]
//! - `error`: the `MappingError` taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use lpmap::config::Config;
//! use lpmap::orchestrator::{MappingContext, PeTopology};
//! use lpmap::placement::PlacementTable;
//!
//! let config = Config::from_yaml_str(r#"
//! LPGROUPS:
//!   A:
//!     repetitions: 2
//!     x: 3
//!     y: 2
//!   B:
//!     z: 5
//! "#)?;
//! config.validate()?;
//!
//! let ctx = MappingContext::from_config(&config, PeTopology { num_pes: 3, pe_index: 1 })?;
//! assert_eq!(ctx.total_entities(), 15);
//! assert_eq!(ctx.to_flat_id("A", "y", 0, 1)?, 4);
//!
//! let mut table = PlacementTable::new();
//! ctx.initialize_local_entities(&mut table)?;
//! assert_eq!(table.len(), 5);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Lookups, partitioning and placement return typed `MappingError`s and
//! configuration problems return `ValidationError`s. Startup orchestration
//! and the CLI use `color_eyre` for reports with context. Every error is a
//! startup-time failure; there is no degraded mode.

pub mod address;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod partition;
pub mod placement;
