//! The hierarchical tracing model used by NML files.
//!
//! A [`Tracing`] holds one or more independently rooted [`Thing`]s. Each
//! thing is a forest of [`Node`]s connected by parent [`Edge`]s. Coordinates
//! are 1-based.

use non_empty_string::NonEmptyString;

use crate::domain::Id;

/// An integer point in voxel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// The x coordinate.
    pub x: i64,
    /// The y coordinate.
    pub y: i64,
    /// The z coordinate.
    pub z: i64,
}

impl Point {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Translates a 1-based point into 0-based space.
    ///
    /// Returns `None` if a coordinate is `i64::MIN`.
    #[must_use]
    pub fn to_zero_based(self) -> Option<Self> {
        Some(Self::new(
            self.x.checked_sub(1)?,
            self.y.checked_sub(1)?,
            self.z.checked_sub(1)?,
        ))
    }

    /// Translates a 0-based point into 1-based space.
    ///
    /// Returns `None` if a coordinate is `i64::MAX`.
    #[must_use]
    pub fn to_one_based(self) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(1)?,
            self.y.checked_add(1)?,
            self.z.checked_add(1)?,
        ))
    }
}

/// A traced point of a skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Identifier, unique across the whole tracing.
    pub id: Id,
    /// Location in 1-based coordinates.
    pub position: Point,
    /// Free-text annotation attached to the node.
    pub comment: Option<NonEmptyString>,
}

impl Node {
    /// Creates a node without a comment.
    #[must_use]
    pub const fn new(id: Id, position: Point) -> Self {
        Self {
            id,
            position,
            comment: None,
        }
    }

    /// Attaches a comment to the node.
    ///
    /// Empty text leaves the node without a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = NonEmptyString::new(comment.into()).ok();
        self
    }
}

/// A parent pointer from `source` (the parent) to `target` (the child).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The parent node.
    pub source: Id,
    /// The child node.
    pub target: Id,
}

impl Edge {
    /// Creates an edge from `source` to `target`.
    #[must_use]
    pub const fn new(source: Id, target: Id) -> Self {
        Self { source, target }
    }
}

/// One independently rooted tree, conceptually a neuron's skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thing {
    /// Identifier assigned by the tracing tool. May collide with other ids.
    pub id: Id,
    /// Neuron id to reuse, if still available.
    pub neuron_id: Option<Id>,
    /// Skeleton id to reuse, if still available.
    pub skeleton_id: Option<Id>,
    /// Nodes in document order.
    pub nodes: Vec<Node>,
    /// Parent edges.
    pub edges: Vec<Edge>,
}

impl Thing {
    /// Creates an empty thing.
    #[must_use]
    pub const fn new(id: Id) -> Self {
        Self {
            id,
            neuron_id: None,
            skeleton_id: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

}

/// A node comment in the legacy `<comments>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The node the comment is attached to.
    pub node: Id,
    /// The comment text.
    pub content: String,
}

impl Comment {
    /// Creates a legacy comment.
    #[must_use]
    pub fn new(node: Id, content: impl Into<String>) -> Self {
        Self {
            node,
            content: content.into(),
        }
    }
}

/// A complete NML tracing: things plus the legacy comment list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracing {
    /// The skeletons of the tracing.
    pub things: Vec<Thing>,
    /// Comments in the legacy, file-level format.
    pub comments: Vec<Comment>,
}

impl Tracing {
    /// Iterates over the nodes of all things.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.things.iter().flat_map(|thing| thing.nodes.iter())
    }

    /// The total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.things.iter().map(|thing| thing.nodes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(1, 1, 1; "origin")]
    #[test_case(0, -4, 12; "mixed signs")]
    #[test_case(4096, 8192, 300; "large")]
    fn coordinates_round_trip(x: i64, y: i64, z: i64) {
        let point = Point::new(x, y, z);
        assert_eq!(
            point.to_zero_based().and_then(Point::to_one_based),
            Some(point)
        );
    }

    #[test]
    fn zero_based_translation() {
        assert_eq!(
            Point::new(1, 2, 3).to_zero_based(),
            Some(Point::new(0, 1, 2))
        );
    }

    #[test_case(Point::new(i64::MIN, 1, 1); "x")]
    #[test_case(Point::new(1, 1, i64::MIN); "z")]
    fn zero_based_translation_overflows(point: Point) {
        assert_eq!(point.to_zero_based(), None);
    }

    #[test]
    fn one_based_translation_overflows() {
        assert_eq!(Point::new(0, i64::MAX, 0).to_one_based(), None);
    }

    #[test]
    fn empty_comment_is_dropped() {
        let node = Node::new(1, Point::default()).with_comment("");
        assert!(node.comment.is_none());
    }

    #[test]
    fn counts_nodes_across_things() {
        let mut first = Thing::new(1);
        first.nodes.push(Node::new(1, Point::default()));
        let mut second = Thing::new(2);
        second.nodes.push(Node::new(2, Point::default()));
        second.nodes.push(Node::new(3, Point::default()));

        let tracing = Tracing {
            things: vec![first, second],
            comments: Vec::new(),
        };
        assert_eq!(tracing.node_count(), 3);
        assert_eq!(tracing.nodes().count(), 3);
    }
}
