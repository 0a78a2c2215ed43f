//! Tracing to CATMAID records.

use std::collections::HashMap;

use tracing::instrument;

use crate::{
    convert::{ConvertError, parents},
    domain::{
        ClassDef, ClassKind, Id, IdAllocator, Instance, InstanceLink, Record, RecordSet,
        RelationDef, RelationKind, Thing, TreeNode, TreeNodeLink, Tracing, catalog::is_catalog_id,
    },
};

/// Converts a tracing into a CATMAID record set.
///
/// A fresh [`IdAllocator`] is used, so repeated conversions of the same
/// tracing produce identical records.
///
/// # Errors
///
/// Returns a [`ConvertError`] if node ids are duplicated, an edge or comment
/// references an unknown node, a node has several parents, the edges of a
/// thing form a cycle, a coordinate cannot be shifted into 0-based space, or
/// no identifiers are left to mint.
pub fn to_records(input: &Tracing) -> Result<RecordSet, ConvertError> {
    to_records_with(input, &mut IdAllocator::new())
}

/// Converts a tracing into a CATMAID record set, claiming ids from `ids`.
///
/// Identifiers already reserved in `ids` are neither reused for neurons and
/// skeletons nor handed out to new records.
///
/// # Errors
///
/// See [`to_records`].
#[instrument(skip_all, fields(things = input.things.len(), nodes = input.node_count()))]
pub fn to_records_with(input: &Tracing, ids: &mut IdAllocator) -> Result<RecordSet, ConvertError> {
    let node_ids = reserve_nodes(input, ids)?;
    let mut builder = Builder {
        ids,
        node_ids,
        records: RecordSet::new(),
    };

    builder.catalog();
    for thing in &input.things {
        builder.thing(thing)?;
    }
    for comment in &input.comments {
        if !builder.node_ids.contains_key(&comment.node) {
            return Err(ConvertError::MissingCommentNode(comment.node));
        }
        builder.label(comment.node, comment.content.clone())?;
    }

    tracing::debug!(records = builder.records.len(), "converted tracing");
    Ok(builder.records)
}

/// Reserves the catalog and every node id, before any id is minted.
///
/// Returns the id each node is written under. Nodes whose id clashes with a
/// catalog entry are renumbered after all other ids have been claimed.
fn reserve_nodes(input: &Tracing, ids: &mut IdAllocator) -> Result<HashMap<Id, Id>, ConvertError> {
    ids.extend(ClassKind::ALL.map(ClassKind::id));
    ids.extend(RelationKind::ALL.map(RelationKind::id));

    let mut node_ids = HashMap::with_capacity(input.node_count());
    let mut clashing = Vec::new();
    for node in input.nodes() {
        if node_ids.insert(node.id, node.id).is_some() {
            return Err(ConvertError::DuplicateNode(node.id));
        }
        if is_catalog_id(node.id) {
            clashing.push(node.id);
        } else {
            ids.reserve(node.id);
        }
    }

    for old in clashing {
        let new = ids.mint().ok_or(ConvertError::IdsExhausted)?;
        tracing::warn!("node {old} clashes with a catalog id and is written as {new}");
        node_ids.insert(old, new);
    }

    Ok(node_ids)
}

struct Builder<'a> {
    ids: &'a mut IdAllocator,
    /// Source node id to written tree-node id.
    node_ids: HashMap<Id, Id>,
    records: RecordSet,
}

impl Builder<'_> {
    fn catalog(&mut self) {
        for kind in ClassKind::ALL {
            self.records.push(Record::Class(ClassDef::catalog(kind)));
        }
        for kind in RelationKind::ALL {
            self.records.push(Record::Relation(RelationDef::catalog(kind)));
        }
    }

    #[instrument(skip_all, fields(thing = thing.id))]
    fn thing(&mut self, thing: &Thing) -> Result<(), ConvertError> {
        let parents = parents(thing)?;

        let neuron = match self.available(thing.neuron_id) {
            Some(id) => id,
            None if self.ids.is_reserved(thing.id) => self.mint()?,
            None => thing.id,
        };
        self.ids.reserve(neuron);
        self.instance(neuron, ClassKind::Neuron, format!("neuron {neuron}"));

        let skeleton = match self.available(thing.skeleton_id) {
            Some(id) => id,
            None => self.mint()?,
        };
        self.ids.reserve(skeleton);
        self.instance(skeleton, ClassKind::Skeleton, format!("skeleton {skeleton}"));

        let link = self.mint()?;
        self.records.push(Record::InstanceLink(InstanceLink {
            id: link,
            relation: RelationKind::ModelOf.id(),
            a: skeleton,
            b: neuron,
        }));
        tracing::debug!(neuron, skeleton, "assigned ids");

        for node in &thing.nodes {
            let location = node
                .position
                .to_zero_based()
                .ok_or(ConvertError::CoordinateOutOfRange(node.id))?;
            self.records.push(Record::TreeNode(TreeNode {
                id: self.node_ids[&node.id],
                skeleton,
                parent: parents.get(&node.id).map(|parent| self.node_ids[parent]),
                location,
            }));

            if let Some(comment) = &node.comment {
                self.label(node.id, comment.to_string())?;
            }
        }

        Ok(())
    }

    fn mint(&mut self) -> Result<Id, ConvertError> {
        self.ids.mint().ok_or(ConvertError::IdsExhausted)
    }

    /// Returns the hinted id if it is set, non-zero and not yet claimed.
    fn available(&self, hint: Option<Id>) -> Option<Id> {
        hint.filter(|&id| id != 0 && !self.ids.is_reserved(id))
    }

    fn instance(&mut self, id: Id, class: ClassKind, name: String) {
        self.records.push(Record::Instance(Instance {
            id,
            class: class.id(),
            name,
        }));
    }

    /// Tags the tree-node of `node` with a new label instance.
    fn label(&mut self, node: Id, text: String) -> Result<(), ConvertError> {
        let label = self.mint()?;
        self.instance(label, ClassKind::Label, text);

        let link = self.mint()?;
        self.records.push(Record::TreeNodeLink(TreeNodeLink {
            id: link,
            relation: RelationKind::LabeledAs.id(),
            treenode: self.node_ids[&node],
            instance: label,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::{Comment, Edge, Node, Point};

    fn single(thing: Thing) -> Tracing {
        Tracing {
            things: vec![thing],
            comments: Vec::new(),
        }
    }

    fn scenario_a() -> Tracing {
        let mut thing = Thing::new(5);
        thing.nodes = vec![
            Node::new(10, Point::new(1, 1, 1)),
            Node::new(11, Point::new(2, 1, 1)).with_comment("soma"),
        ];
        thing.edges = vec![Edge::new(10, 11)];
        single(thing)
    }

    fn instances_of(records: &RecordSet, class: ClassKind) -> Vec<&Instance> {
        records
            .instances()
            .iter()
            .filter(|instance| instance.class == class.id())
            .collect()
    }

    #[test]
    fn converts_single_commented_thing() {
        let records = to_records(&scenario_a()).unwrap();

        let neurons = instances_of(&records, ClassKind::Neuron);
        assert_eq!(neurons.len(), 1);
        assert_eq!(neurons[0].id, 5);
        assert_eq!(neurons[0].name, "neuron 5");

        let skeletons = instances_of(&records, ClassKind::Skeleton);
        assert_eq!(skeletons.len(), 1);
        let skeleton = skeletons[0].id;
        assert!(![5, 10, 11].contains(&skeleton));

        assert_eq!(records.instance_links().len(), 1);
        let model_of = records.instance_links()[0];
        assert_eq!(model_of.relation, RelationKind::ModelOf.id());
        assert_eq!((model_of.a, model_of.b), (skeleton, 5));

        assert_eq!(
            records.treenodes(),
            &[
                TreeNode {
                    id: 10,
                    skeleton,
                    parent: None,
                    location: Point::new(0, 0, 0),
                },
                TreeNode {
                    id: 11,
                    skeleton,
                    parent: Some(10),
                    location: Point::new(1, 0, 0),
                },
            ]
        );

        let labels = instances_of(&records, ClassKind::Label);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "soma");

        assert_eq!(records.treenode_links().len(), 1);
        let labeled_as = records.treenode_links()[0];
        assert_eq!(labeled_as.relation, RelationKind::LabeledAs.id());
        assert_eq!(labeled_as.treenode, 11);
        assert_eq!(labeled_as.instance, labels[0].id);
    }

    #[test]
    fn catalog_is_always_emitted_with_fixed_ids() {
        for tracing in [Tracing::default(), scenario_a()] {
            let records = to_records(&tracing).unwrap();
            let classes: Vec<(Id, &str)> = records
                .classes()
                .iter()
                .map(|class| (class.id, class.name.as_str()))
                .collect();
            assert_eq!(
                classes,
                vec![(50, "root"), (48, "label"), (47, "neuron"), (46, "skeleton")]
            );
            let relations: Vec<(Id, &str)> = records
                .relations()
                .iter()
                .map(|relation| (relation.id, relation.name.as_str()))
                .collect();
            assert_eq!(relations, vec![(54, "model_of"), (56, "labeled_as")]);
        }
    }

    #[test]
    fn primary_keys_are_unique() {
        let mut first = Thing::new(1);
        first.neuron_id = Some(2);
        first.skeleton_id = Some(2);
        first.nodes = vec![
            Node::new(1, Point::new(1, 1, 1)).with_comment("a"),
            Node::new(2, Point::new(2, 1, 1)).with_comment("b"),
            Node::new(47, Point::new(3, 1, 1)).with_comment("c"),
        ];
        first.edges = vec![Edge::new(1, 2), Edge::new(2, 47)];
        let mut second = Thing::new(1);
        second.nodes = vec![Node::new(3, Point::new(1, 1, 1))];

        let tracing = Tracing {
            things: vec![first, second],
            comments: vec![Comment::new(3, "legacy")],
        };
        let records = to_records(&tracing).unwrap();

        let mut seen = HashSet::new();
        for id in records.ids() {
            assert!(seen.insert(id), "duplicate primary key {id}");
        }
        assert_eq!(seen.len(), records.len());
    }

    #[test]
    fn neuron_hint_is_preferred() {
        let mut thing = Thing::new(5);
        thing.neuron_id = Some(30);
        let records = to_records(&single(thing)).unwrap();
        assert_eq!(instances_of(&records, ClassKind::Neuron)[0].id, 30);
    }

    #[test]
    fn zero_neuron_hint_falls_back_to_thing_id() {
        let mut thing = Thing::new(5);
        thing.neuron_id = Some(0);
        let records = to_records(&single(thing)).unwrap();
        assert_eq!(instances_of(&records, ClassKind::Neuron)[0].id, 5);
    }

    #[test]
    fn used_neuron_hint_falls_back_to_thing_id() {
        let mut thing = Thing::new(5);
        thing.neuron_id = Some(10);
        thing.nodes = vec![Node::new(10, Point::new(1, 1, 1))];
        let records = to_records(&single(thing)).unwrap();
        assert_eq!(instances_of(&records, ClassKind::Neuron)[0].id, 5);
    }

    #[test]
    fn used_thing_id_mints_fresh_neuron() {
        let mut thing = Thing::new(10);
        thing.nodes = vec![Node::new(10, Point::new(1, 1, 1))];
        let records = to_records(&single(thing)).unwrap();
        // catalog tops out at 56
        assert_eq!(instances_of(&records, ClassKind::Neuron)[0].id, 57);
    }

    #[test]
    fn skeleton_never_falls_back_to_thing_id() {
        let mut thing = Thing::new(5);
        thing.neuron_id = Some(30);
        let records = to_records(&single(thing)).unwrap();
        let skeleton = instances_of(&records, ClassKind::Skeleton)[0].id;
        assert_ne!(skeleton, 5);
        assert_eq!(skeleton, 57);
    }

    #[test]
    fn skeleton_hint_is_preferred_when_unused() {
        let mut thing = Thing::new(5);
        thing.skeleton_id = Some(200);
        let records = to_records(&single(thing)).unwrap();
        assert_eq!(instances_of(&records, ClassKind::Skeleton)[0].id, 200);
        assert_eq!(records.instance_links()[0].id, 201);
    }

    #[test]
    fn things_sharing_an_id_get_distinct_neurons() {
        let tracing = Tracing {
            things: vec![Thing::new(3), Thing::new(3)],
            comments: Vec::new(),
        };
        let records = to_records(&tracing).unwrap();
        let neurons: Vec<Id> = instances_of(&records, ClassKind::Neuron)
            .iter()
            .map(|neuron| neuron.id)
            .collect();
        assert_eq!(neurons.len(), 2);
        assert_eq!(neurons[0], 3);
        assert_ne!(neurons[1], 3);
    }

    #[test]
    fn legacy_comment_matches_node_comment() {
        let inline = scenario_a();

        let mut legacy = scenario_a();
        legacy.things[0].nodes[1].comment = None;
        legacy.comments.push(Comment::new(11, "soma"));

        let inline = to_records(&inline).unwrap();
        let legacy = to_records(&legacy).unwrap();

        assert_eq!(
            instances_of(&inline, ClassKind::Label)[0].name,
            instances_of(&legacy, ClassKind::Label)[0].name
        );
        let inline_link = inline.treenode_links()[0];
        let legacy_link = legacy.treenode_links()[0];
        assert_eq!(inline_link.relation, legacy_link.relation);
        assert_eq!(inline_link.treenode, legacy_link.treenode);
    }

    #[test]
    fn catalog_clash_is_renumbered() {
        let mut thing = Thing::new(1);
        thing.nodes = vec![
            Node::new(46, Point::new(1, 1, 1)),
            Node::new(60, Point::new(2, 1, 1)).with_comment("tip"),
        ];
        thing.edges = vec![Edge::new(46, 60)];
        let records = to_records(&single(thing)).unwrap();

        let treenodes = records.treenodes();
        assert_eq!(treenodes[0].id, 61);
        assert_eq!(treenodes[1].id, 60);
        assert_eq!(treenodes[1].parent, Some(61));
    }

    #[test]
    fn repeated_conversions_do_not_share_ids() {
        let first = to_records(&scenario_a()).unwrap();
        let second = to_records(&scenario_a()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn external_allocator_is_respected() {
        let mut ids = IdAllocator::new();
        ids.reserve(5);
        ids.reserve(1000);

        let records = to_records_with(&scenario_a(), &mut ids).unwrap();
        let neuron = instances_of(&records, ClassKind::Neuron)[0].id;
        assert_eq!(neuron, 1001);
    }

    #[test]
    fn edge_to_unknown_node_is_rejected() {
        let mut thing = Thing::new(1);
        thing.nodes = vec![Node::new(10, Point::new(1, 1, 1))];
        thing.edges = vec![Edge::new(10, 99)];
        assert_eq!(
            to_records(&single(thing)),
            Err(ConvertError::MissingEdgeNode { thing: 1, node: 99 })
        );
    }

    #[test]
    fn comment_on_unknown_node_is_rejected() {
        let mut tracing = scenario_a();
        tracing.comments.push(Comment::new(12, "lost"));
        assert_eq!(
            to_records(&tracing),
            Err(ConvertError::MissingCommentNode(12))
        );
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let mut tracing = scenario_a();
        let mut other = Thing::new(6);
        other.nodes = vec![Node::new(11, Point::new(1, 1, 1))];
        tracing.things.push(other);
        assert_eq!(to_records(&tracing), Err(ConvertError::DuplicateNode(11)));
    }

    #[test]
    fn second_parent_is_rejected() {
        let mut thing = Thing::new(1);
        thing.nodes = vec![
            Node::new(1, Point::new(1, 1, 1)),
            Node::new(2, Point::new(1, 1, 1)),
            Node::new(3, Point::new(1, 1, 1)),
        ];
        thing.edges = vec![Edge::new(1, 3), Edge::new(2, 3)];
        assert_eq!(
            to_records(&single(thing)),
            Err(ConvertError::MultipleParents(3))
        );
    }

    #[test]
    fn largest_node_id_exhausts_identifiers() {
        let mut thing = Thing::new(1);
        thing.nodes = vec![Node::new(Id::MAX, Point::new(1, 1, 1))];
        assert_eq!(to_records(&single(thing)), Err(ConvertError::IdsExhausted));
    }

    #[test]
    fn coordinate_below_range_is_rejected() {
        let mut thing = Thing::new(1);
        thing.nodes = vec![Node::new(4, Point::new(1, i64::MIN, 1))];
        assert_eq!(
            to_records(&single(thing)),
            Err(ConvertError::CoordinateOutOfRange(4))
        );
    }

    #[test]
    fn cycle_is_rejected() {
        let mut thing = Thing::new(8);
        thing.nodes = vec![
            Node::new(1, Point::new(1, 1, 1)),
            Node::new(2, Point::new(1, 1, 1)),
        ];
        thing.edges = vec![Edge::new(1, 2), Edge::new(2, 1)];
        assert_eq!(to_records(&single(thing)), Err(ConvertError::Cycle(8)));
    }
}
