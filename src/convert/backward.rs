//! CATMAID records to tracing.

use std::collections::{BTreeMap, HashMap};

use non_empty_string::NonEmptyString;
use tracing::instrument;

use crate::{
    convert::{ConvertError, parents},
    domain::{
        ClassKind, Comment, Edge, Id, Instance, Node, RecordSet, RelationKind, Thing, Tracing,
    },
};

/// Reconstructs a tracing from a CATMAID record set.
///
/// Every `model_of` link between a skeleton and a neuron becomes one thing;
/// tree-nodes are attached to the thing of their skeleton. Labels attached
/// with `labeled_as` become node comments and are also listed in the legacy
/// comment block.
///
/// # Errors
///
/// Returns a [`ConvertError`] if a mandatory class or relation is missing, if
/// any link, tree-node or parent reference does not resolve, if a parent lies
/// in another skeleton or the parents form a cycle, or if a location cannot
/// be shifted into 1-based space.
#[instrument(skip_all, fields(records = records.len()))]
pub fn to_tracing(records: &RecordSet) -> Result<Tracing, ConvertError> {
    let catalog = records.catalog();
    let class = |kind| catalog.class(kind).ok_or(ConvertError::MissingClass(kind));
    let relation = |kind| {
        catalog
            .relation(kind)
            .ok_or(ConvertError::MissingRelation(kind))
    };
    let label_class = class(ClassKind::Label)?;
    let neuron_class = class(ClassKind::Neuron)?;
    let skeleton_class = class(ClassKind::Skeleton)?;
    let model_of = relation(RelationKind::ModelOf)?;
    let labeled_as = relation(RelationKind::LabeledAs)?;

    let instances: HashMap<Id, &Instance> = records
        .instances()
        .iter()
        .map(|instance| (instance.id, instance))
        .collect();
    let instance_of = |link: Id, id: Id, class: Id| match instances.get(&id) {
        Some(instance) if instance.class == class => Ok(*instance),
        _ => Err(ConvertError::UnknownInstance { link, instance: id }),
    };

    let mut things = Vec::new();
    let mut by_skeleton = HashMap::new();
    for link in records
        .instance_links()
        .iter()
        .filter(|link| link.relation == model_of)
    {
        let skeleton = instance_of(link.id, link.a, skeleton_class)?.id;
        let neuron = instance_of(link.id, link.b, neuron_class)?.id;
        if by_skeleton.insert(skeleton, things.len()).is_some() {
            return Err(ConvertError::DuplicateSkeleton(skeleton));
        }
        things.push(Thing {
            id: neuron,
            neuron_id: Some(neuron),
            skeleton_id: Some(skeleton),
            ..Thing::default()
        });
    }

    let skeletons: HashMap<Id, Id> = records
        .treenodes()
        .iter()
        .map(|node| (node.id, node.skeleton))
        .collect();
    let mut comments: BTreeMap<Id, &str> = BTreeMap::new();
    for link in records
        .treenode_links()
        .iter()
        .filter(|link| link.relation == labeled_as)
    {
        if !skeletons.contains_key(&link.treenode) {
            return Err(ConvertError::UnknownTreeNode {
                record: link.id,
                treenode: link.treenode,
            });
        }
        let label = instance_of(link.id, link.instance, label_class)?;
        comments.insert(link.treenode, &label.name);
    }

    for treenode in records.treenodes() {
        let thing = by_skeleton
            .get(&treenode.skeleton)
            .map(|&index| &mut things[index])
            .ok_or(ConvertError::UnknownSkeleton {
                treenode: treenode.id,
                skeleton: treenode.skeleton,
            })?;

        let position = treenode
            .location
            .to_one_based()
            .ok_or(ConvertError::CoordinateOutOfRange(treenode.id))?;
        thing.nodes.push(Node {
            id: treenode.id,
            position,
            comment: comments
                .get(&treenode.id)
                .and_then(|text| NonEmptyString::new((*text).to_string()).ok()),
        });

        if let Some(parent) = treenode.parent {
            match skeletons.get(&parent) {
                None => {
                    return Err(ConvertError::UnknownTreeNode {
                        record: treenode.id,
                        treenode: parent,
                    });
                }
                Some(&skeleton) if skeleton != treenode.skeleton => {
                    return Err(ConvertError::ForeignParent {
                        treenode: treenode.id,
                        parent,
                    });
                }
                Some(_) => thing.edges.push(Edge::new(parent, treenode.id)),
            }
        }
    }

    for thing in &things {
        parents(thing)?;
    }

    // Node comments are repeated in the legacy block.
    let comments = comments
        .into_iter()
        .map(|(node, text)| Comment::new(node, text))
        .collect();

    tracing::debug!(things = things.len(), "reconstructed tracing");
    Ok(Tracing { things, comments })
}
