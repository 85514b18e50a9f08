#[cfg(test)]
mod mapping_regression_tests {
    use std::collections::HashSet;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use lpmap::address::{self, AddressSpace};
    use lpmap::config_loader::load_config;
    use lpmap::error::MappingError;
    use lpmap::layout::{Group, Layout};
    use lpmap::orchestrator::{MappingContext, PeTopology};
    use lpmap::partition::plan_partitions;
    use lpmap::placement::{KernelProcessMap, PlacementTable};

    const SCENARIO: &str = r#"
general:
  kernel_processes_per_pe: 4
LPGROUPS:
  A:
    repetitions: 2
    x: 3
    y: 2
  B:
    repetitions: 1
    z: 5
"#;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", yaml).unwrap();
        file
    }

    fn network_layout() -> Layout {
        Layout::new(vec![
            Group::new("MODELNET_GRP", 16)
                .with_type("server", 1)
                .with_type("modelnet_dragonfly", 1)
                .with_type("dragonfly_router", 1),
            Group::new("STORAGE_GRP", 4)
                .with_type("ost", 3)
                .with_type("mds", 1),
        ])
    }

    /// The worked example loaded from a file, end to end
    #[test]
    fn test_scenario_from_config_file() {
        let file = write_config(SCENARIO);
        let config = load_config(file.path()).unwrap();
        let ctx = MappingContext::from_config(&config, PeTopology { num_pes: 1, pe_index: 0 }).unwrap();

        assert_eq!(ctx.total_entities(), 15);

        let id = ctx.to_structured_identity(7).unwrap();
        assert_eq!(id.group_name, "A");
        assert_eq!(id.repetition_id, 1);
        assert_eq!(id.type_name, "x");
        assert_eq!(id.offset, 2);

        let id = ctx.to_structured_identity(10).unwrap();
        assert_eq!(id.group_name, "B");
        assert_eq!(id.repetition_id, 0);
        assert_eq!(id.type_name, "z");
        assert_eq!(id.offset, 0);

        assert_eq!(ctx.to_flat_id("A", "y", 0, 1).unwrap(), 4);

        assert!(matches!(
            ctx.to_structured_identity(15),
            Err(MappingError::RangeViolation { value: 15, .. })
        ));
    }

    #[test]
    fn test_scenario_does_not_split_across_four_pes() {
        let file = write_config(SCENARIO);
        let config = load_config(file.path()).unwrap();

        let err = MappingContext::from_config(&config, PeTopology { num_pes: 4, pe_index: 0 }).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MappingError>(),
            Some(&MappingError::PartitionMismatch { total: 15, num_pes: 4 })
        );
        assert!(plan_partitions(15, 4).is_err());
    }

    #[test]
    fn test_bijection_over_whole_space() {
        let layout = network_layout();
        let space = AddressSpace::new(layout.clone()).unwrap();
        assert_eq!(space.total_entities(), 16 * 3 + 4 * 4);

        for flat_id in 0..space.total_entities() {
            let id = space.to_structured_identity(flat_id).unwrap();
            let back = space
                .to_flat_id(&id.group_name, &id.type_name, id.repetition_id, id.offset)
                .unwrap();
            assert_eq!(back, flat_id);
        }

        // And the other direction: walk every structured identity in order
        let mut expected = 0;
        for group in &layout.groups {
            for rep in 0..group.repetitions {
                for ty in &group.types {
                    for offset in 0..ty.count {
                        let flat = space.to_flat_id(&group.name, &ty.name, rep, offset).unwrap();
                        assert_eq!(flat, expected);
                        let id = space.to_structured_identity(flat).unwrap();
                        assert_eq!(
                            (id.group_name.as_str(), id.type_name.as_str(), id.repetition_id, id.offset),
                            (group.name.as_str(), ty.name.as_str(), rep, offset)
                        );
                        expected += 1;
                    }
                }
            }
        }
        assert_eq!(expected, space.total_entities());
    }

    #[test]
    fn test_total_matches_independent_sum() {
        let layout = network_layout();
        let independent: u64 = layout
            .groups
            .iter()
            .map(|g| g.repetitions * g.types.iter().map(|t| t.count).sum::<u64>())
            .sum();
        assert_eq!(layout.total_entities(), independent);
        assert_eq!(AddressSpace::new(layout).unwrap().total_entities(), independent);
    }

    #[test]
    fn test_determinism_across_independent_builds() {
        let a = AddressSpace::new(network_layout()).unwrap();
        let b = AddressSpace::new(network_layout()).unwrap();
        for flat_id in 0..a.total_entities() {
            assert_eq!(
                a.to_structured_identity(flat_id).unwrap(),
                b.to_structured_identity(flat_id).unwrap()
            );
            assert_eq!(
                a.to_structured_identity(flat_id).unwrap(),
                address::to_structured_identity(&network_layout(), flat_id).unwrap()
            );
        }
    }

    /// Every PE places independently; together they cover each id exactly once
    #[test]
    fn test_per_pe_placement_covers_space_once() {
        let total = network_layout().total_entities();
        let num_pes = 8;
        assert_eq!(total % num_pes, 0);

        let mut seen = HashSet::new();
        for pe_index in 0..num_pes {
            let ctx = MappingContext::new(
                network_layout(),
                PeTopology { num_pes, pe_index },
                KernelProcessMap::new(16, 2).unwrap(),
            )
            .unwrap();

            let mut table = PlacementTable::new();
            let summary = ctx.initialize_local_entities(&mut table).unwrap();
            assert_eq!(summary.placed, total / num_pes);
            assert_eq!(summary.per_kernel_process.iter().sum::<u64>(), summary.placed);

            for record in &table.records {
                assert!(seen.insert(record.flat_id), "flat id {} placed twice", record.flat_id);
                assert_eq!(ctx.owner_pe(record.flat_id).unwrap(), pe_index);
                assert_eq!(ctx.resolve_local(record.flat_id).unwrap(), record.local_index);
                assert_eq!(record.kernel_process_id, record.local_index % 16);
                assert_eq!(record.worker_id, record.kernel_process_id % 2);
                assert_eq!(table.type_names[record.type_handle], record.identity.type_name);
            }
        }
        assert_eq!(seen.len() as u64, total);
    }

    #[test]
    fn test_neighbor_addressing_from_symbolic_names() {
        // A model computes the router paired with each server by name
        let ctx = MappingContext::new(
            network_layout(),
            PeTopology { num_pes: 4, pe_index: 1 },
            KernelProcessMap::new(16, 1).unwrap(),
        )
        .unwrap();

        let server = ctx.to_flat_id("MODELNET_GRP", "server", 5, 0).unwrap();
        let id = ctx.to_structured_identity(server).unwrap();
        let router = ctx
            .to_flat_id("MODELNET_GRP", "dragonfly_router", id.repetition_id, 0)
            .unwrap();
        assert_eq!(router, server + 2);

        // Entities on other PEs are addressable but not locally resolvable
        let remote = ctx.to_flat_id("MODELNET_GRP", "server", 0, 0).unwrap();
        assert_eq!(ctx.owner_pe(remote).unwrap(), 0);
        assert!(ctx.resolve_local(remote).is_err());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let cases = [
            "LPGROUPS: {}\n",
            "LPGROUPS:\n  G:\n    repetitions: 0\n    node: 1\n",
            "LPGROUPS:\n  G:\n    node: 0\n",
            "LPGROUPS:\n  G:\n    node: many\n",
            "OTHER:\n  G:\n    node: 1\n",
        ];
        for yaml in cases {
            let file = write_config(yaml);
            assert!(load_config(file.path()).is_err(), "accepted: {}", yaml);
        }
    }
}
