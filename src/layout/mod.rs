//! Hierarchical layout descriptor.
//!
//! A layout is the ordered list of entity groups that every processing
//! element reads at startup. Declaration order of groups, and of types within
//! a group, defines the flat id enumeration order, so nothing in this module
//! ever reorders its contents.

pub mod types;
pub mod validation;

pub use types::{EntityType, Group, Layout};
