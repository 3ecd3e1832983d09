use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use proptest::prelude::*;
use proptest::sample::Index;

use mixin_runtime_composer::{Body, Composer, Instance, MixinDescriptor, MixinId, MixinRef};

/// Each inner vec picks the declared dependencies of one node among the
/// nodes built before it.
fn arb_graph() -> impl Strategy<Value = Vec<Vec<Index>>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), 1..12)
}

struct Graph {
    nodes: Vec<MixinDescriptor>,
    by_id: HashMap<MixinId, MixinDescriptor>,
    constructed: Rc<RefCell<Vec<MixinId>>>,
}

fn build(shape: &[Vec<Index>]) -> Graph {
    let composer = Composer::new();
    let constructed = Rc::new(RefCell::new(Vec::new()));
    let mut nodes: Vec<MixinDescriptor> = Vec::new();
    let mut by_id = HashMap::new();

    for (i, picks) in shape.iter().enumerate() {
        let declared: Vec<MixinRef> = if i == 0 {
            Vec::new()
        } else {
            picks.iter().map(|pick| (&nodes[pick.index(i)]).into()).collect()
        };

        let log = constructed.clone();
        let body = Body::builder(format!("node{}", i))
            .init(move |ctx, _| {
                log.borrow_mut().push(ctx.mixin_id());
                Ok(Instance::stateless())
            })
            .build()
            .unwrap();

        let descriptor = composer.compose(&declared, body).unwrap();
        by_id.insert(descriptor.id(), descriptor.clone());
        nodes.push(descriptor);
    }

    Graph {
        nodes,
        by_id,
        constructed,
    }
}

fn closure(graph: &Graph, node: &MixinDescriptor) -> BTreeSet<MixinId> {
    let mut seen = BTreeSet::new();
    let mut pending: Vec<MixinId> = node.dependency_ids();
    while let Some(id) = pending.pop() {
        if seen.insert(id) {
            pending.extend(graph.by_id[&id].dependency_ids());
        }
    }
    seen
}

proptest! {
    /// Resolved lists hold each transitive dependency exactly once, and every
    /// entry comes after everything it depends on.
    #[test]
    fn prop_resolution_is_deduplicated_and_dependency_first(shape in arb_graph()) {
        let graph = build(&shape);

        for node in &graph.nodes {
            let resolved = node.dependency_ids();
            let unique: BTreeSet<MixinId> = resolved.iter().copied().collect();
            prop_assert_eq!(unique.len(), resolved.len(), "duplicate in {:?}", resolved);
            prop_assert_eq!(&unique, &closure(&graph, node));
            prop_assert!(!unique.contains(&node.id()));

            for (position, id) in resolved.iter().enumerate() {
                for dependency in graph.by_id[id].dependency_ids() {
                    let before = resolved[..position].contains(&dependency);
                    prop_assert!(before, "{} listed before its dependency {}", id, dependency);
                }
            }
        }
    }

    /// Constructing any node instantiates each mixin of its lineage once,
    /// in resolved order.
    #[test]
    fn prop_each_mixin_instantiated_once(shape in arb_graph()) {
        let graph = build(&shape);

        for node in &graph.nodes {
            graph.constructed.borrow_mut().clear();
            node.construct(&[]).unwrap();

            let mut expected = node.dependency_ids();
            expected.push(node.id());
            let constructed = graph.constructed.borrow().clone();
            prop_assert_eq!(constructed, expected);
        }
    }
}
