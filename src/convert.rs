//! Conversion between the tracing and record models.
//!
//! [`to_records`] maps a [`Tracing`](crate::Tracing) onto a CATMAID
//! [`RecordSet`](crate::RecordSet); [`to_tracing`] reconstructs the tracing.
//! Both are all-or-nothing: any inconsistency in the input aborts the
//! conversion with a [`ConvertError`].

use std::collections::{HashMap, HashSet};

use petgraph::{algo::is_cyclic_directed, graphmap::DiGraphMap};
use thiserror::Error;

use crate::domain::{ClassKind, Id, RelationKind, Thing};

mod backward;
mod forward;

pub use backward::to_tracing;
pub use forward::{to_records, to_records_with};

/// Errors raised by the converters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    /// Two nodes share an id.
    #[error("node {0} appears more than once")]
    DuplicateNode(Id),
    /// An edge references a node that is not part of its thing.
    #[error("edge in thing {thing} references node {node}, which is not part of that thing")]
    MissingEdgeNode {
        /// The thing owning the edge.
        thing: Id,
        /// The missing node.
        node: Id,
    },
    /// A legacy comment references an unknown node.
    #[error("comment references node {0}, which does not exist")]
    MissingCommentNode(Id),
    /// A node is the target of more than one edge.
    #[error("node {0} has more than one parent")]
    MultipleParents(Id),
    /// The edges of a thing contain a cycle.
    #[error("the edges of thing {0} contain a cycle")]
    Cycle(Id),
    /// Every identifier up to the largest representable one is in use.
    #[error("no identifiers left to assign")]
    IdsExhausted,
    /// Shifting a node between 1-based and 0-based coordinates overflows.
    #[error("coordinates of node {0} are out of range")]
    CoordinateOutOfRange(Id),
    /// A mandatory class definition is absent.
    #[error("missing class definition '{0}'")]
    MissingClass(ClassKind),
    /// A mandatory relation definition is absent.
    #[error("missing relation definition '{0}'")]
    MissingRelation(RelationKind),
    /// A tree-node belongs to a skeleton no neuron is modelled by.
    #[error("tree-node {treenode} belongs to unknown skeleton {skeleton}")]
    UnknownSkeleton {
        /// The orphaned tree-node.
        treenode: Id,
        /// The skeleton it references.
        skeleton: Id,
    },
    /// A skeleton is the model of more than one neuron.
    #[error("skeleton {0} is modelled more than once")]
    DuplicateSkeleton(Id),
    /// A link references an instance that does not exist or has the wrong class.
    #[error("link {link} references unknown instance {instance}")]
    UnknownInstance {
        /// The offending link.
        link: Id,
        /// The missing instance.
        instance: Id,
    },
    /// A tree-node's parent belongs to a different skeleton.
    #[error("tree-node {treenode} has parent {parent} from another skeleton")]
    ForeignParent {
        /// The child tree-node.
        treenode: Id,
        /// The parent tree-node.
        parent: Id,
    },
    /// A record references a tree-node that does not exist.
    #[error("record {record} references unknown tree-node {treenode}")]
    UnknownTreeNode {
        /// The offending record.
        record: Id,
        /// The missing tree-node.
        treenode: Id,
    },
}

/// The category of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The input is missing structure it must have.
    Structural,
    /// The input contains references that do not resolve.
    Referential,
}

impl ConvertError {
    /// Classifies the error.
    #[must_use]
    pub const fn fault(&self) -> Fault {
        match self {
            Self::DuplicateNode(_)
            | Self::MissingEdgeNode { .. }
            | Self::MissingCommentNode(_)
            | Self::MultipleParents(_)
            | Self::Cycle(_)
            | Self::IdsExhausted
            | Self::CoordinateOutOfRange(_)
            | Self::MissingClass(_)
            | Self::MissingRelation(_) => Fault::Structural,
            Self::UnknownSkeleton { .. }
            | Self::DuplicateSkeleton(_)
            | Self::UnknownInstance { .. }
            | Self::ForeignParent { .. }
            | Self::UnknownTreeNode { .. } => Fault::Referential,
        }
    }
}

/// Maps every child node to its parent, validating that the edges of the
/// thing form a forest over its own nodes.
fn parents(thing: &Thing) -> Result<HashMap<Id, Id>, ConvertError> {
    let members: HashSet<Id> = thing.nodes.iter().map(|node| node.id).collect();
    let mut parents = HashMap::with_capacity(thing.edges.len());
    let mut graph = DiGraphMap::<Id, ()>::with_capacity(members.len(), thing.edges.len());

    for edge in &thing.edges {
        for node in [edge.source, edge.target] {
            if !members.contains(&node) {
                return Err(ConvertError::MissingEdgeNode {
                    thing: thing.id,
                    node,
                });
            }
        }
        if parents.insert(edge.target, edge.source).is_some() {
            return Err(ConvertError::MultipleParents(edge.target));
        }
        graph.add_edge(edge.source, edge.target, ());
    }

    if is_cyclic_directed(&graph) {
        return Err(ConvertError::Cycle(thing.id));
    }

    Ok(parents)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use test_case::test_case;

    use super::*;
    use crate::domain::{Comment, Edge, Node, Point, Thing, Tracing};

    fn branching_tracing() -> Tracing {
        let mut first = Thing::new(1);
        first.nodes = vec![
            Node::new(1, Point::new(10, 10, 1)),
            Node::new(2, Point::new(11, 10, 1)).with_comment("branch"),
            Node::new(3, Point::new(12, 11, 1)),
            Node::new(4, Point::new(12, 9, 2)).with_comment("ending"),
        ];
        first.edges = vec![Edge::new(1, 2), Edge::new(2, 3), Edge::new(2, 4)];

        let mut second = Thing::new(2);
        second.nodes = vec![Node::new(5, Point::new(1, 1, 1))];

        Tracing {
            things: vec![first, second],
            comments: Vec::new(),
        }
    }

    fn edge_set(tracing: &Tracing) -> HashSet<Edge> {
        tracing
            .things
            .iter()
            .flat_map(|thing| thing.edges.iter().copied())
            .collect()
    }

    #[test]
    fn round_trip_preserves_node_ids_and_edges() {
        let original = branching_tracing();
        let restored = to_tracing(&to_records(&original).unwrap()).unwrap();

        let original_ids: Vec<Id> = original.nodes().map(|node| node.id).collect();
        let restored_ids: Vec<Id> = restored.nodes().map(|node| node.id).collect();
        assert_eq!(original_ids, restored_ids);
        assert_eq!(edge_set(&original), edge_set(&restored));
    }

    #[test]
    fn round_trip_preserves_comments() {
        let original = branching_tracing();
        let restored = to_tracing(&to_records(&original).unwrap()).unwrap();

        let comments: Vec<(Id, String)> = restored
            .nodes()
            .filter_map(|node| Some((node.id, node.comment.as_ref()?.to_string())))
            .collect();
        assert_eq!(
            comments,
            vec![(2, "branch".to_string()), (4, "ending".to_string())]
        );
    }

    #[test_case(1, 1, 1)]
    #[test_case(0, 0, 0)]
    #[test_case(-7, 250, 31)]
    #[test_case(100_000, 1, 99_999)]
    fn round_trip_preserves_coordinates(x: i64, y: i64, z: i64) {
        let mut thing = Thing::new(1);
        thing.nodes.push(Node::new(9, Point::new(x, y, z)));
        let original = Tracing {
            things: vec![thing],
            comments: Vec::new(),
        };

        let restored = to_tracing(&to_records(&original).unwrap()).unwrap();
        assert_eq!(restored.things[0].nodes[0].position, Point::new(x, y, z));
    }

    #[test]
    fn round_trip_keeps_neuron_and_skeleton_ids() {
        let records = to_records(&branching_tracing()).unwrap();
        let restored = to_tracing(&records).unwrap();
        let reconverted = to_records(&restored).unwrap();

        assert_eq!(records.instance_links(), reconverted.instance_links());
        assert_eq!(records.treenodes(), reconverted.treenodes());
    }

    #[test]
    fn legacy_comments_survive_round_trip() {
        let mut tracing = branching_tracing();
        tracing.comments.push(Comment::new(5, "legacy"));

        let restored = to_tracing(&to_records(&tracing).unwrap()).unwrap();
        let node = &restored.things[1].nodes[0];
        assert_eq!(node.comment.as_ref().unwrap().as_str(), "legacy");
    }

    #[test]
    fn faults_are_classified() {
        assert_eq!(ConvertError::Cycle(1).fault(), Fault::Structural);
        assert_eq!(
            ConvertError::MissingClass(ClassKind::Label).fault(),
            Fault::Structural
        );
        assert_eq!(ConvertError::IdsExhausted.fault(), Fault::Structural);
        assert_eq!(
            ConvertError::ForeignParent {
                treenode: 1,
                parent: 2
            }
            .fault(),
            Fault::Referential
        );
        assert_eq!(
            ConvertError::UnknownSkeleton {
                treenode: 1,
                skeleton: 2
            }
            .fault(),
            Fault::Referential
        );
    }
}
