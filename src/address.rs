//! Flat id enumeration.
//!
//! Ids are handed out by walking groups in declaration order, then the
//! repetitions of each group, then the types of one repetition in declaration
//! order, then the offsets of each type. Every step of that walk consumes one
//! id, starting at 0. So a group occupies one contiguous range of ids, each
//! repetition a contiguous sub-range of length `repetition_size`, and each
//! type a contiguous run inside that repetition.
//!
//! [`AddressSpace`] answers lookups in both directions from prefix sums built
//! once at startup. The free functions [`to_flat_id`] and
//! [`to_structured_identity`] perform the same mapping by scanning the layout,
//! with no precomputed state.

use serde::Serialize;

use crate::config::ValidationError;
use crate::error::MappingError;
use crate::layout::{Group, Layout};

/// Globally unique entity address
pub type FlatId = u64;

/// The (group, type, repetition, offset) coordinates of one entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructuredIdentity {
    /// Index of the group in the layout
    pub group_id: usize,
    pub group_name: String,
    /// Index of the type within its group
    pub type_id: usize,
    pub type_name: String,
    /// Which copy of the group's type list, in `[0, repetitions)`
    pub repetition_id: u64,
    /// Instance index within the type, in `[0, count)`
    pub offset: u64,
}

/// Precomputed id ranges of one group
#[derive(Debug, Clone)]
struct GroupSpan {
    base: FlatId,
    end: FlatId,
    repetition_size: u64,
    /// Start of each type's run within a repetition
    type_bases: Vec<u64>,
    /// End (exclusive) of each type's run within a repetition
    type_ends: Vec<u64>,
}

/// Immutable view of a validated layout with prefix sums for O(log n) lookup
#[derive(Debug, Clone)]
pub struct AddressSpace {
    layout: Layout,
    spans: Vec<GroupSpan>,
    total: u64,
}

impl AddressSpace {
    /// Validate `layout` and precompute its id ranges
    pub fn new(layout: Layout) -> Result<Self, ValidationError> {
        layout.validate()?;

        let mut spans = Vec::with_capacity(layout.groups.len());
        let mut base: FlatId = 0;
        for group in &layout.groups {
            let mut type_bases = Vec::with_capacity(group.types.len());
            let mut type_ends = Vec::with_capacity(group.types.len());
            let mut cursor = 0u64;
            for ty in &group.types {
                type_bases.push(cursor);
                cursor += ty.count;
                type_ends.push(cursor);
            }

            // Validation guarantees the product and sum fit in u64
            let end = base + cursor * group.repetitions;
            spans.push(GroupSpan {
                base,
                end,
                repetition_size: cursor,
                type_bases,
                type_ends,
            });
            base = end;
        }

        log::debug!(
            "Address space built: {} groups, {} entities",
            spans.len(),
            base
        );

        Ok(Self {
            layout,
            spans,
            total: base,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of addressable entities; ids are `[0, total_entities())`
    pub fn total_entities(&self) -> u64 {
        self.total
    }

    /// First flat id and one-past-last flat id of the named group
    pub fn group_range(&self, group_name: &str) -> Result<(FlatId, FlatId), MappingError> {
        let (group_id, _) = self
            .layout
            .find_group(group_name)
            .ok_or_else(|| MappingError::group_not_found(group_name))?;
        let span = &self.spans[group_id];
        Ok((span.base, span.end))
    }

    /// Structured identity to flat id.
    ///
    /// Names are resolved before ranges are checked, so an unknown name is
    /// always reported as `NameNotFound`.
    pub fn to_flat_id(
        &self,
        group_name: &str,
        type_name: &str,
        repetition_id: u64,
        offset: u64,
    ) -> Result<FlatId, MappingError> {
        let (group_id, group) = self
            .layout
            .find_group(group_name)
            .ok_or_else(|| MappingError::group_not_found(group_name))?;
        let (type_id, ty) = group
            .find_type(type_name)
            .ok_or_else(|| MappingError::type_not_found(type_name))?;

        if repetition_id >= group.repetitions {
            return Err(MappingError::out_of_range(
                "repetition id",
                repetition_id,
                group.repetitions,
            ));
        }
        if offset >= ty.count {
            return Err(MappingError::out_of_range("offset", offset, ty.count));
        }

        let span = &self.spans[group_id];
        Ok(span.base + repetition_id * span.repetition_size + span.type_bases[type_id] + offset)
    }

    /// Flat id to structured identity
    pub fn to_structured_identity(&self, flat_id: FlatId) -> Result<StructuredIdentity, MappingError> {
        if flat_id >= self.total {
            return Err(MappingError::out_of_range("flat id", flat_id, self.total));
        }

        // First group whose range ends past flat_id
        let group_id = self.spans.partition_point(|s| s.end <= flat_id);
        let span = &self.spans[group_id];
        let group = &self.layout.groups[group_id];

        let within_group = flat_id - span.base;
        let repetition_id = within_group / span.repetition_size;
        let within_repetition = within_group % span.repetition_size;

        // Zero-count types have an empty run and are skipped here
        let type_id = span.type_ends.partition_point(|&end| end <= within_repetition);
        let ty = &group.types[type_id];

        Ok(StructuredIdentity {
            group_id,
            group_name: group.name.clone(),
            type_id,
            type_name: ty.name.clone(),
            repetition_id,
            offset: within_repetition - span.type_bases[type_id],
        })
    }
}

/// Total of a layout that may not have been validated, failing when any
/// group or the grand total does not fit in a flat id
fn addressable_total(layout: &Layout) -> Result<u64, MappingError> {
    layout.checked_total_entities().ok_or_else(|| {
        MappingError::UnaddressableLayout("total entity count overflows a 64-bit id".to_string())
    })
}

/// Entity count of one group of a layout already checked by `addressable_total`
fn group_size(group: &Group) -> Result<u64, MappingError> {
    group.checked_entity_count().ok_or_else(|| {
        MappingError::UnaddressableLayout(format!("group '{}' overflows a 64-bit id", group.name))
    })
}

/// Scan-based forward mapping over an arbitrary layout.
///
/// Accumulates the ids of every preceding group, then the preceding types of
/// the current repetition, then the preceding repetitions, then the offset.
/// Layouts whose total does not fit in a flat id are rejected up front.
pub fn to_flat_id(
    layout: &Layout,
    group_name: &str,
    type_name: &str,
    repetition_id: u64,
    offset: u64,
) -> Result<FlatId, MappingError> {
    addressable_total(layout)?;

    // Every partial sum below is bounded by the checked total
    let mut flat_id: FlatId = 0;
    let mut target: Option<&Group> = None;
    for group in &layout.groups {
        if group.name == group_name {
            target = Some(group);
            break;
        }
        flat_id += group_size(group)?;
    }
    let group = target.ok_or_else(|| MappingError::group_not_found(group_name))?;

    let mut found = None;
    for ty in &group.types {
        if ty.name == type_name {
            found = Some(ty);
            break;
        }
        flat_id += ty.count;
    }
    let ty = found.ok_or_else(|| MappingError::type_not_found(type_name))?;

    if repetition_id >= group.repetitions {
        return Err(MappingError::out_of_range(
            "repetition id",
            repetition_id,
            group.repetitions,
        ));
    }
    if offset >= ty.count {
        return Err(MappingError::out_of_range("offset", offset, ty.count));
    }

    Ok(flat_id + repetition_id * group.repetition_size() + offset)
}

/// Scan-based reverse mapping over an arbitrary layout
pub fn to_structured_identity(
    layout: &Layout,
    flat_id: FlatId,
) -> Result<StructuredIdentity, MappingError> {
    let total = addressable_total(layout)?;
    if flat_id >= total {
        return Err(MappingError::out_of_range("flat id", flat_id, total));
    }

    let mut group_base: FlatId = 0;
    for (group_id, group) in layout.groups.iter().enumerate() {
        let size = group_size(group)?;
        if flat_id < group_base + size {
            let repetition_size = group.repetition_size();
            let within_group = flat_id - group_base;
            let within_repetition = within_group % repetition_size;

            let mut type_base = 0u64;
            for (type_id, ty) in group.types.iter().enumerate() {
                if within_repetition < type_base + ty.count {
                    return Ok(StructuredIdentity {
                        group_id,
                        group_name: group.name.clone(),
                        type_id,
                        type_name: ty.name.clone(),
                        repetition_id: within_group / repetition_size,
                        offset: within_repetition - type_base,
                    });
                }
                type_base += ty.count;
            }
        }
        group_base += size;
    }

    Err(MappingError::out_of_range("flat id", flat_id, group_base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NameKind;

    fn sample_layout() -> Layout {
        Layout::new(vec![
            Group::new("A", 2).with_type("x", 3).with_type("y", 2),
            Group::new("B", 1).with_type("z", 5),
        ])
    }

    fn identity(group: &str, ty: &str, rep: u64, offset: u64) -> (String, String, u64, u64) {
        (group.to_string(), ty.to_string(), rep, offset)
    }

    fn coords(id: &StructuredIdentity) -> (String, String, u64, u64) {
        (id.group_name.clone(), id.type_name.clone(), id.repetition_id, id.offset)
    }

    #[test]
    fn test_concrete_scenario() {
        let space = AddressSpace::new(sample_layout()).unwrap();
        assert_eq!(space.total_entities(), 15);

        let id = space.to_structured_identity(7).unwrap();
        assert_eq!(coords(&id), identity("A", "x", 1, 2));
        assert_eq!((id.group_id, id.type_id), (0, 0));

        let id = space.to_structured_identity(10).unwrap();
        assert_eq!(coords(&id), identity("B", "z", 0, 0));
        assert_eq!((id.group_id, id.type_id), (1, 0));

        assert_eq!(space.to_flat_id("A", "y", 0, 1).unwrap(), 4);
    }

    #[test]
    fn test_full_enumeration_order() {
        let space = AddressSpace::new(sample_layout()).unwrap();
        let expected = [
            ("A", "x", 0, 0),
            ("A", "x", 0, 1),
            ("A", "x", 0, 2),
            ("A", "y", 0, 0),
            ("A", "y", 0, 1),
            ("A", "x", 1, 0),
            ("A", "x", 1, 1),
            ("A", "x", 1, 2),
            ("A", "y", 1, 0),
            ("A", "y", 1, 1),
            ("B", "z", 0, 0),
            ("B", "z", 0, 1),
            ("B", "z", 0, 2),
            ("B", "z", 0, 3),
            ("B", "z", 0, 4),
        ];
        for (flat_id, (g, t, r, o)) in expected.iter().enumerate() {
            let id = space.to_structured_identity(flat_id as u64).unwrap();
            assert_eq!(coords(&id), identity(g, t, *r, *o), "flat id {}", flat_id);
        }
    }

    #[test]
    fn test_out_of_range_flat_id() {
        let space = AddressSpace::new(sample_layout()).unwrap();
        assert_eq!(
            space.to_structured_identity(15),
            Err(MappingError::RangeViolation {
                what: "flat id",
                value: 15,
                start: 0,
                end: 15
            })
        );
        assert!(to_structured_identity(&sample_layout(), 15).is_err());
    }

    #[test]
    fn test_unknown_names() {
        let space = AddressSpace::new(sample_layout()).unwrap();
        match space.to_flat_id("C", "x", 0, 0) {
            Err(MappingError::NameNotFound { kind, name }) => {
                assert_eq!(kind, NameKind::Group);
                assert_eq!(name, "C");
            }
            other => panic!("expected NameNotFound, got {:?}", other),
        }
        match space.to_flat_id("B", "x", 0, 0) {
            Err(MappingError::NameNotFound { kind, .. }) => assert_eq!(kind, NameKind::Type),
            other => panic!("expected NameNotFound, got {:?}", other),
        }
        // Name errors win over range errors
        assert!(matches!(
            space.to_flat_id("B", "nope", 99, 99),
            Err(MappingError::NameNotFound { .. })
        ));
    }

    #[test]
    fn test_out_of_range_coordinates_are_not_clamped() {
        let space = AddressSpace::new(sample_layout()).unwrap();
        assert!(matches!(
            space.to_flat_id("A", "x", 2, 0),
            Err(MappingError::RangeViolation { what: "repetition id", .. })
        ));
        assert!(matches!(
            space.to_flat_id("A", "x", 0, 3),
            Err(MappingError::RangeViolation { what: "offset", .. })
        ));
        assert!(to_flat_id(&sample_layout(), "A", "y", 0, 2).is_err());
    }

    #[test]
    fn test_zero_count_types_are_skipped() {
        let layout = Layout::new(vec![Group::new("G", 3)
            .with_type("empty", 0)
            .with_type("a", 2)
            .with_type("hole", 0)
            .with_type("b", 1)]);
        let space = AddressSpace::new(layout.clone()).unwrap();
        assert_eq!(space.total_entities(), 9);

        for flat_id in 0..9 {
            let id = space.to_structured_identity(flat_id).unwrap();
            assert!(id.type_name == "a" || id.type_name == "b");
            assert_eq!(id, to_structured_identity(&layout, flat_id).unwrap());
        }
        assert!(space.to_flat_id("G", "empty", 0, 0).is_err());
    }

    #[test]
    fn test_prefix_sums_agree_with_scan() {
        let layout = Layout::new(vec![
            Group::new("servers", 4).with_type("server", 1).with_type("nic", 2),
            Group::new("routers", 3).with_type("router", 4),
            Group::new("storage", 1).with_type("disk", 7).with_type("ctrl", 1),
        ]);
        let space = AddressSpace::new(layout.clone()).unwrap();
        assert_eq!(space.total_entities(), layout.total_entities());

        for flat_id in 0..space.total_entities() {
            let fast = space.to_structured_identity(flat_id).unwrap();
            let slow = to_structured_identity(&layout, flat_id).unwrap();
            assert_eq!(fast, slow);

            let back = space
                .to_flat_id(&fast.group_name, &fast.type_name, fast.repetition_id, fast.offset)
                .unwrap();
            assert_eq!(back, flat_id);
            assert_eq!(
                to_flat_id(&layout, &slow.group_name, &slow.type_name, slow.repetition_id, slow.offset)
                    .unwrap(),
                flat_id
            );
        }
    }

    #[test]
    fn test_scan_rejects_overflowing_layouts() {
        // Group A wraps around u64, which would alias A's and B's first ids
        let wrapping = Layout::new(vec![
            Group::new("A", u64::MAX).with_type("x", 2),
            Group::new("B", 1).with_type("z", 1),
        ]);
        assert!(matches!(
            to_flat_id(&wrapping, "A", "x", 0, 0),
            Err(MappingError::UnaddressableLayout(_))
        ));
        assert!(matches!(
            to_flat_id(&wrapping, "B", "z", 0, 0),
            Err(MappingError::UnaddressableLayout(_))
        ));
        assert!(matches!(
            to_structured_identity(&wrapping, 0),
            Err(MappingError::UnaddressableLayout(_))
        ));

        // Each group fits but the sum does not
        let summing = Layout::new(vec![
            Group::new("A", 1).with_type("x", u64::MAX),
            Group::new("B", 1).with_type("y", 1),
        ]);
        assert!(matches!(
            to_structured_identity(&summing, u64::MAX),
            Err(MappingError::UnaddressableLayout(_))
        ));
        assert!(to_flat_id(&summing, "B", "y", 0, 0).is_err());
    }

    #[test]
    fn test_group_range() {
        let space = AddressSpace::new(sample_layout()).unwrap();
        assert_eq!(space.group_range("A").unwrap(), (0, 10));
        assert_eq!(space.group_range("B").unwrap(), (10, 15));
        assert!(space.group_range("C").is_err());
    }

    #[test]
    fn test_invalid_layout_is_rejected() {
        assert!(AddressSpace::new(Layout::default()).is_err());
    }
}
