//! Error taxonomy for the addressing layer.
//!
//! Every error here is raised during startup, before any simulated event is
//! processed, and is terminal for the run. Callers decide whether to abort or
//! report; the library never panics on bad input.

use std::fmt;

/// Which level of the naming hierarchy a lookup failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Group,
    Type,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Group => write!(f, "group"),
            NameKind::Type => write!(f, "type"),
        }
    }
}

/// Errors raised by the enumerator, the partition planner and the placement driver
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("No {kind} named '{name}' in the layout")]
    NameNotFound { kind: NameKind, name: String },

    #[error("{what} {value} is outside [{start}, {end})")]
    RangeViolation {
        what: &'static str,
        value: u64,
        start: u64,
        end: u64,
    },

    #[error("{total} entities cannot be split evenly across {num_pes} processing elements")]
    PartitionMismatch { total: u64, num_pes: u64 },

    #[error("Invalid execution topology: {0}")]
    InvalidTopology(String),

    #[error("Layout cannot be addressed: {0}")]
    UnaddressableLayout(String),

    #[error("Registration of local entity {local_index} failed: {reason}")]
    Registration { local_index: u64, reason: String },
}

impl MappingError {
    pub(crate) fn group_not_found(name: &str) -> Self {
        MappingError::NameNotFound {
            kind: NameKind::Group,
            name: name.to_string(),
        }
    }

    pub(crate) fn type_not_found(name: &str) -> Self {
        MappingError::NameNotFound {
            kind: NameKind::Type,
            name: name.to_string(),
        }
    }

    /// `value` is not below `bound`
    pub(crate) fn out_of_range(what: &'static str, value: u64, bound: u64) -> Self {
        MappingError::RangeViolation {
            what,
            value,
            start: 0,
            end: bound,
        }
    }

    /// `value` is outside the half-open range `[start, end)`
    pub(crate) fn outside(what: &'static str, value: u64, start: u64, end: u64) -> Self {
        MappingError::RangeViolation {
            what,
            value,
            start,
            end,
        }
    }
}
