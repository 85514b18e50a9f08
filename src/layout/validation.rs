//! Layout validation.
//!
//! Checks that a layout describes a non-empty, addressable id space before
//! anything is enumerated from it.

use std::collections::HashSet;

use super::types::Layout;
use crate::config::ValidationError;

impl Layout {
    /// Validate the layout
    ///
    /// Rejects:
    /// - a layout with no groups
    /// - empty or duplicate group names
    /// - empty or duplicate type names within a group
    /// - zero repetitions
    /// - groups whose type counts sum to zero
    /// - a total entity count that is zero or does not fit in `u64`
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.groups.is_empty() {
            return Err(ValidationError::InvalidLayout(
                "layout declares no groups".to_string(),
            ));
        }

        let mut group_names = HashSet::new();
        for group in &self.groups {
            if group.name.is_empty() {
                return Err(ValidationError::InvalidLayout(
                    "group name cannot be empty".to_string(),
                ));
            }
            if !group_names.insert(group.name.as_str()) {
                return Err(ValidationError::InvalidLayout(format!(
                    "duplicate group name '{}'",
                    group.name
                )));
            }
            if group.repetitions == 0 {
                return Err(ValidationError::InvalidGroup {
                    group: group.name.clone(),
                    reason: "repetitions must be at least 1".to_string(),
                });
            }

            let mut type_names = HashSet::new();
            for ty in &group.types {
                if ty.name.is_empty() {
                    return Err(ValidationError::InvalidGroup {
                        group: group.name.clone(),
                        reason: "type name cannot be empty".to_string(),
                    });
                }
                if !type_names.insert(ty.name.as_str()) {
                    return Err(ValidationError::InvalidGroup {
                        group: group.name.clone(),
                        reason: format!("duplicate type name '{}'", ty.name),
                    });
                }
            }

            if group.repetition_size() == 0 {
                return Err(ValidationError::InvalidGroup {
                    group: group.name.clone(),
                    reason: "group declares no entities".to_string(),
                });
            }
        }

        match self.checked_total_entities() {
            None => Err(ValidationError::InvalidLayout(
                "total entity count overflows a 64-bit id".to_string(),
            )),
            Some(0) => Err(ValidationError::InvalidLayout(
                "total entity count is zero".to_string(),
            )),
            Some(total) => {
                log::debug!(
                    "Layout validated: {} groups, {} entities",
                    self.groups.len(),
                    total
                );
                Ok(())
            }
        }
    }
}
