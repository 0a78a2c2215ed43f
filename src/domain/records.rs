//! The relational record model used by CATMAID.
//!
//! A [`RecordSet`] stores records partitioned by kind. Every record has a
//! primary key drawn from one namespace shared by all kinds.

use std::collections::HashMap;

use crate::domain::{
    Id,
    catalog::{ClassKind, RelationKind},
    tree::Point,
};

/// A class definition (`catmaid.class`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    /// Primary key.
    pub id: Id,
    /// The class name, e.g. `neuron`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

impl ClassDef {
    /// The catalog definition of `kind`, with its fixed id.
    #[must_use]
    pub fn catalog(kind: ClassKind) -> Self {
        Self {
            id: kind.id(),
            name: kind.name().to_string(),
            description: kind.description().to_string(),
        }
    }

    /// The catalog kind this class names, if any.
    #[must_use]
    pub fn kind(&self) -> Option<ClassKind> {
        self.name.parse().ok()
    }
}

/// A relation definition (`catmaid.relation`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    /// Primary key.
    pub id: Id,
    /// The relation name, e.g. `model_of`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the relation holds in both directions.
    pub reciprocal: bool,
}

impl RelationDef {
    /// The catalog definition of `kind`, with its fixed id.
    #[must_use]
    pub fn catalog(kind: RelationKind) -> Self {
        Self {
            id: kind.id(),
            name: kind.name().to_string(),
            description: kind.description().to_string(),
            reciprocal: false,
        }
    }

    /// The catalog kind this relation names, if any.
    #[must_use]
    pub fn kind(&self) -> Option<RelationKind> {
        self.name.parse().ok()
    }
}

/// A typed object (`catmaid.classinstance`): a neuron, skeleton or label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Primary key.
    pub id: Id,
    /// The id of the instance's class.
    pub class: Id,
    /// Display name, or the text of a label.
    pub name: String,
}

/// A typed link between two instances (`catmaid.classinstanceclassinstance`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLink {
    /// Primary key.
    pub id: Id,
    /// The id of the relation.
    pub relation: Id,
    /// The subject instance (the skeleton of a `model_of` link).
    pub a: Id,
    /// The object instance (the neuron of a `model_of` link).
    pub b: Id,
}

/// A skeleton point (`catmaid.treenode`) in 0-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode {
    /// Primary key.
    pub id: Id,
    /// The skeleton instance owning the tree-node.
    pub skeleton: Id,
    /// The parent tree-node, `None` for roots.
    pub parent: Option<Id>,
    /// Location in 0-based coordinates.
    pub location: Point,
}

/// A typed link from a tree-node to an instance (`catmaid.treenodeclassinstance`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNodeLink {
    /// Primary key.
    pub id: Id,
    /// The id of the relation.
    pub relation: Id,
    /// The linked tree-node.
    pub treenode: Id,
    /// The linked instance.
    pub instance: Id,
}

/// A record of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A class definition.
    Class(ClassDef),
    /// A relation definition.
    Relation(RelationDef),
    /// A class instance.
    Instance(Instance),
    /// A link between instances.
    InstanceLink(InstanceLink),
    /// A tree-node.
    TreeNode(TreeNode),
    /// A link from a tree-node to an instance.
    TreeNodeLink(TreeNodeLink),
}

impl Record {
    /// The primary key of the record.
    #[must_use]
    pub const fn id(&self) -> Id {
        match self {
            Self::Class(class) => class.id,
            Self::Relation(relation) => relation.id,
            Self::Instance(instance) => instance.id,
            Self::InstanceLink(link) => link.id,
            Self::TreeNode(node) => node.id,
            Self::TreeNodeLink(link) => link.id,
        }
    }
}

/// A collection of CATMAID records, partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    classes: Vec<ClassDef>,
    relations: Vec<RelationDef>,
    instances: Vec<Instance>,
    instance_links: Vec<InstanceLink>,
    treenodes: Vec<TreeNode>,
    treenode_links: Vec<TreeNodeLink>,
}

impl RecordSet {
    /// Creates an empty record set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the partition of its kind.
    pub fn push(&mut self, record: Record) {
        match record {
            Record::Class(class) => self.classes.push(class),
            Record::Relation(relation) => self.relations.push(relation),
            Record::Instance(instance) => self.instances.push(instance),
            Record::InstanceLink(link) => self.instance_links.push(link),
            Record::TreeNode(node) => self.treenodes.push(node),
            Record::TreeNodeLink(link) => self.treenode_links.push(link),
        }
    }

    /// Class definitions.
    #[must_use]
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    /// Relation definitions.
    #[must_use]
    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }

    /// Class instances.
    #[must_use]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Links between instances.
    #[must_use]
    pub fn instance_links(&self) -> &[InstanceLink] {
        &self.instance_links
    }

    /// Tree-nodes.
    #[must_use]
    pub fn treenodes(&self) -> &[TreeNode] {
        &self.treenodes
    }

    /// Links from tree-nodes to instances.
    #[must_use]
    pub fn treenode_links(&self) -> &[TreeNodeLink] {
        &self.treenode_links
    }

    /// Iterates over the primary keys of all records.
    #[cfg(test)]
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.classes
            .iter()
            .map(|class| class.id)
            .chain(self.relations.iter().map(|relation| relation.id))
            .chain(self.instances.iter().map(|instance| instance.id))
            .chain(self.instance_links.iter().map(|link| link.id))
            .chain(self.treenodes.iter().map(|node| node.id))
            .chain(self.treenode_links.iter().map(|link| link.id))
    }

    /// The total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
            + self.relations.len()
            + self.instances.len()
            + self.instance_links.len()
            + self.treenodes.len()
            + self.treenode_links.len()
    }

    /// Returns `true` if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up catalog entries by name.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog {
            classes: self
                .classes
                .iter()
                .filter_map(|class| Some((class.kind()?, class.id)))
                .collect(),
            relations: self
                .relations
                .iter()
                .filter_map(|relation| Some((relation.kind()?, relation.id)))
                .collect(),
        }
    }
}

impl Extend<Record> for RecordSet {
    fn extend<T: IntoIterator<Item = Record>>(&mut self, iter: T) {
        for record in iter {
            self.push(record);
        }
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        let mut records = Self::new();
        records.extend(iter);
        records
    }
}

/// Catalog entries present in a [`RecordSet`], keyed by kind.
///
/// Record sets produced elsewhere need not use the fixed ids, so the ids
/// here are the ones found in the data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    classes: HashMap<ClassKind, Id>,
    relations: HashMap<RelationKind, Id>,
}

impl Catalog {
    /// The id of the class of the given kind, if defined.
    #[must_use]
    pub fn class(&self, kind: ClassKind) -> Option<Id> {
        self.classes.get(&kind).copied()
    }

    /// The id of the relation of the given kind, if defined.
    #[must_use]
    pub fn relation(&self, kind: RelationKind) -> Option<Id> {
        self.relations.get(&kind).copied()
    }
}
