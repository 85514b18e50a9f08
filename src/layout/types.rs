//! Layout type definitions.
//!
//! This file contains the group / type / count structures produced by the
//! configuration loader and consumed by the address enumerator.

use serde::{Deserialize, Serialize};

/// Key inside a group section that sets the repetition count rather than
/// declaring a type.
pub const REPETITIONS_KEY: &str = "repetitions";

/// One entity type declared inside a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// Type name, unique within its group
    pub name: String,
    /// Number of instances of this type in each repetition of the group
    pub count: u64,
}

impl EntityType {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// A named group of entity types, repeated `repetitions` times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, unique among groups
    pub name: String,
    /// How many times the type list is laid out back to back
    pub repetitions: u64,
    /// Types in declaration order
    pub types: Vec<EntityType>,
}

impl Group {
    /// Create an empty group with the given repetition count
    pub fn new(name: impl Into<String>, repetitions: u64) -> Self {
        Self {
            name: name.into(),
            repetitions,
            types: Vec::new(),
        }
    }

    /// Builder-style helper that appends a type declaration
    pub fn with_type(mut self, name: impl Into<String>, count: u64) -> Self {
        self.types.push(EntityType::new(name, count));
        self
    }

    /// Number of entities in a single repetition (sum of all type counts)
    pub fn repetition_size(&self) -> u64 {
        self.types
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.count))
    }

    /// Number of entities in the whole group, `None` on overflow
    pub fn checked_entity_count(&self) -> Option<u64> {
        self.types
            .iter()
            .try_fold(0u64, |acc, t| acc.checked_add(t.count))?
            .checked_mul(self.repetitions)
    }

    /// Locate a type by name, returning its index and declaration
    pub fn find_type(&self, name: &str) -> Option<(usize, &EntityType)> {
        self.types.iter().enumerate().find(|(_, t)| t.name == name)
    }
}

/// The full, ordered description of every entity population in a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub groups: Vec<Group>,
}

impl Layout {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Locate a group by name, returning its index and declaration
    pub fn find_group(&self, name: &str) -> Option<(usize, &Group)> {
        self.groups.iter().enumerate().find(|(_, g)| g.name == name)
    }

    /// Total entity count: sum over groups of `repetitions * sum(type counts)`.
    ///
    /// Zero groups yields 0, which `validate` rejects. Saturates on overflow;
    /// validated layouts never reach that point.
    pub fn total_entities(&self) -> u64 {
        self.groups.iter().fold(0u64, |acc, g| {
            acc.saturating_add(g.checked_entity_count().unwrap_or(u64::MAX))
        })
    }

    /// Like `total_entities`, but reports overflow instead of saturating
    pub fn checked_total_entities(&self) -> Option<u64> {
        self.groups
            .iter()
            .try_fold(0u64, |acc, g| acc.checked_add(g.checked_entity_count()?))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> Layout {
        Layout::new(vec![
            Group::new("A", 2).with_type("x", 3).with_type("y", 2),
            Group::new("B", 1).with_type("z", 5),
        ])
    }

    #[test]
    fn test_total_entities() {
        assert_eq!(sample_layout().total_entities(), 15);
        assert_eq!(sample_layout().checked_total_entities(), Some(15));
        assert_eq!(Layout::default().total_entities(), 0);
    }

    #[test]
    fn test_repetition_size_and_group_count() {
        let layout = sample_layout();
        assert_eq!(layout.groups[0].repetition_size(), 5);
        assert_eq!(layout.groups[0].checked_entity_count(), Some(10));
        assert_eq!(layout.groups[1].checked_entity_count(), Some(5));
    }

    #[test]
    fn test_find_by_name_keeps_declaration_index() {
        let layout = sample_layout();
        let (idx, group) = layout.find_group("B").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(group.types[0].name, "z");

        let (tidx, ty) = layout.groups[0].find_type("y").unwrap();
        assert_eq!(tidx, 1);
        assert_eq!(ty.count, 2);

        assert!(layout.find_group("C").is_none());
        assert!(layout.groups[0].find_type("z").is_none());
    }

    #[test]
    fn test_overflow_is_detected() {
        let layout = Layout::new(vec![
            Group::new("huge", u64::MAX).with_type("x", 2),
        ]);
        assert_eq!(layout.checked_total_entities(), None);
        assert_eq!(layout.total_entities(), u64::MAX);
    }
}
