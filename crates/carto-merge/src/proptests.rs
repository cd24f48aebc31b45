use proptest::prelude::*;

use carto_graph::{Graph, Primitive};
use carto_types::{Coordinate, PrimitiveId, VersionStamp};

use crate::{ConflictRegistry, MergeDriver, MergeError};

const IDS: usize = 6;

#[derive(Clone, Debug)]
struct Local {
    lat: i32,
    version: u64,
    modified: bool,
    deleted: bool,
    incomplete: bool,
}

#[derive(Clone, Debug)]
struct Upstream {
    lat: i32,
    version: u64,
    modified: bool,
    deleted: bool,
    incomplete: bool,
}

fn local() -> impl Strategy<Value = Local> {
    (0..3i32, 0..4u64, any::<bool>(), any::<bool>(), prop::bool::weighted(0.2)).prop_map(
        |(lat, version, modified, deleted, incomplete)| Local {
            lat,
            version,
            modified,
            deleted,
            incomplete,
        },
    )
}

fn upstream() -> impl Strategy<Value = Upstream> {
    (
        0..3i32,
        0..4u64,
        prop::bool::weighted(0.3),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.2),
    )
        .prop_map(|(lat, version, modified, deleted, incomplete)| Upstream {
            lat,
            version,
            modified,
            deleted,
            incomplete,
        })
}

fn point(id: i64, lat: i32, version: u64) -> Primitive {
    let p = Primitive::point(id, Coordinate::from_e7(lat, 0));
    if version == 0 {
        p
    } else {
        p.with_version(VersionStamp::new(version, 0))
    }
}

fn build_target(specs: &[Option<Local>]) -> Graph {
    let mut graph = Graph::new();
    for (i, spec) in specs.iter().enumerate() {
        let Some(s) = spec else { continue };
        let id = i as i64 + 1;
        let mut p = if s.incomplete {
            Primitive::incomplete(PrimitiveId::point(id))
        } else {
            point(id, s.lat, s.version)
        };
        p.modified = s.modified;
        p.deleted = s.deleted;
        graph.insert(p).unwrap();
    }
    graph
}

/// Upstream points plus, when both endpoints resolve somewhere, one chain.
fn build_incoming(specs: &[Option<Upstream>], chain: (i64, i64), target: &Graph) -> Graph {
    let mut graph = Graph::new();
    for (i, spec) in specs.iter().enumerate() {
        let Some(s) = spec else { continue };
        let id = i as i64 + 1;
        let mut p = if s.incomplete {
            Primitive::incomplete(PrimitiveId::point(id))
        } else {
            point(id, s.lat, s.version)
        };
        p.modified = s.modified && !s.incomplete;
        p.deleted = s.deleted && !s.incomplete;
        graph.insert(p).unwrap();
    }
    let held = |id: i64| {
        let pid = PrimitiveId::point(id);
        graph.contains(&pid) || target.contains(&pid)
    };
    if chain.0 != chain.1 && held(chain.0) && held(chain.1) {
        graph
            .insert(Primitive::chain(100, chain.0, chain.1).with_version(VersionStamp::new(1, 0)))
            .unwrap();
    }
    graph
}

fn scenario() -> impl Strategy<Value = (Vec<Option<Local>>, Vec<Option<Upstream>>, (i64, i64))> {
    (
        prop::collection::vec(prop::option::of(local()), IDS),
        prop::collection::vec(prop::option::of(upstream()), IDS),
        (1..=IDS as i64, 1..=IDS as i64),
    )
}

proptest! {
    #[test]
    fn second_pass_changes_nothing((locals, upstreams, chain) in scenario()) {
        let mut target = build_target(&locals);
        let incoming = build_incoming(&upstreams, chain, &target);
        let mut conflicts = ConflictRegistry::new();
        let driver = MergeDriver::default();

        driver.merge_graph(&mut target, &mut conflicts, &incoming).unwrap();
        let graph_after_first = target.clone();
        let conflicts_after_first = conflicts.clone();

        driver.merge_graph(&mut target, &mut conflicts, &incoming).unwrap();
        prop_assert_eq!(&target, &graph_after_first);
        prop_assert_eq!(&conflicts, &conflicts_after_first);
    }

    #[test]
    fn complete_primitives_stay_complete((locals, upstreams, chain) in scenario()) {
        let mut target = build_target(&locals);
        let complete_before: Vec<PrimitiveId> = target
            .iter()
            .filter(|p| !p.incomplete)
            .map(|p| p.id)
            .collect();
        let incoming = build_incoming(&upstreams, chain, &target);
        let mut conflicts = ConflictRegistry::new();

        MergeDriver::default()
            .merge_graph(&mut target, &mut conflicts, &incoming)
            .unwrap();

        for id in complete_before {
            prop_assert!(!target.get(&id).unwrap().incomplete, "{} regressed", id);
        }
    }

    #[test]
    fn conflicts_are_exact((locals, upstreams, chain) in scenario()) {
        let mut target = build_target(&locals);
        let before = target.clone();
        let incoming = build_incoming(&upstreams, chain, &target);
        let mut conflicts = ConflictRegistry::new();

        let report = MergeDriver::default()
            .merge_graph(&mut target, &mut conflicts, &incoming)
            .unwrap();

        let mut ids = conflicts.ids();
        prop_assert_eq!(&ids, &report.conflicts);
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), conflicts.len());

        for conflict in &conflicts {
            let held = target.get(&conflict.canonical).unwrap();
            prop_assert_eq!(held, &conflict.mine);
            prop_assert_eq!(before.get(&conflict.canonical), Some(held));
            prop_assert_eq!(Some(&conflict.incoming), incoming.get(&conflict.canonical));
        }
    }

    #[test]
    fn references_stay_resolvable(
        (locals, upstreams, _) in scenario(),
        a in 1..=IDS as i64,
        b in 1..=IDS as i64,
    ) {
        prop_assume!(a != b);
        let mut target = build_target(&locals);
        let mut incoming = Graph::new();
        for (i, spec) in upstreams.iter().enumerate() {
            if let Some(s) = spec {
                incoming.insert(point(i as i64 + 1, s.lat, s.version)).unwrap();
            }
        }
        incoming.insert(Primitive::chain(100, a, b)).unwrap();

        let resolvable = |id: i64| {
            let pid = PrimitiveId::point(id);
            incoming.contains(&pid) || target.contains(&pid)
        };
        let expect_ok = resolvable(a) && resolvable(b);
        let mut conflicts = ConflictRegistry::new();

        let result = MergeDriver::default().merge_graph(&mut target, &mut conflicts, &incoming);
        if expect_ok {
            prop_assert!(result.is_ok());
            prop_assert!(target.dangling_references().is_empty());
            prop_assert!(target.contains(&PrimitiveId::chain(100)));
        } else {
            let is_unresolved = matches!(result, Err(MergeError::UnresolvedReference { .. }));
            prop_assert!(is_unresolved);
        }
    }
}
