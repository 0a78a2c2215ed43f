//! The fixed catalog of CATMAID classes and relations.
//!
//! CATMAID consumers key off these exact primary keys, so they are never
//! allocated dynamically.

use std::{fmt, str::FromStr};

use crate::domain::Id;

/// A class in the fixed CATMAID catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassKind {
    /// The root of the tracing system.
    Root,
    /// A free-text tag attached to tree-nodes.
    Label,
    /// A neuron, modelled by a skeleton.
    Neuron,
    /// A skeleton, owning tree-nodes.
    Skeleton,
}

impl ClassKind {
    /// Every class, in the order it is emitted.
    pub const ALL: [Self; 4] = [Self::Root, Self::Label, Self::Neuron, Self::Skeleton];

    /// The fixed primary key of this class.
    #[must_use]
    pub const fn id(self) -> Id {
        match self {
            Self::Root => 50,
            Self::Label => 48,
            Self::Neuron => 47,
            Self::Skeleton => 46,
        }
    }

    /// The CATMAID `class_name`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Label => "label",
            Self::Neuron => "neuron",
            Self::Skeleton => "skeleton",
        }
    }

    /// The description written alongside the class.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Root => "The root node for the tracing system",
            Self::Label => "A label",
            Self::Neuron => "A neuron representation",
            Self::Skeleton => "The representation of a skeleton",
        }
    }
}

/// A relation in the fixed CATMAID catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// Links a skeleton to the neuron it models.
    ModelOf,
    /// Links a tree-node to a label.
    LabeledAs,
}

impl RelationKind {
    /// Every relation, in the order it is emitted.
    pub const ALL: [Self; 2] = [Self::ModelOf, Self::LabeledAs];

    /// The fixed primary key of this relation.
    #[must_use]
    pub const fn id(self) -> Id {
        match self {
            Self::ModelOf => 54,
            Self::LabeledAs => 56,
        }
    }

    /// The CATMAID `relation_name`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModelOf => "model_of",
            Self::LabeledAs => "labeled_as",
        }
    }

    /// The description written alongside the relation.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ModelOf => "Marks something as a model of something else.",
            Self::LabeledAs => "Something is labeled by sth. else.",
        }
    }
}

/// Returns `true` if `id` is one of the fixed catalog keys.
#[must_use]
pub fn is_catalog_id(id: Id) -> bool {
    ClassKind::ALL.iter().any(|kind| kind.id() == id)
        || RelationKind::ALL.iter().any(|kind| kind.id() == id)
}

/// Error returned when a name is not part of the fixed catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("'{0}' is not a catalog entry")]
pub struct UnknownNameError(String);

impl FromStr for ClassKind {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownNameError(s.to_string()))
    }
}

impl FromStr for RelationKind {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownNameError(s.to_string()))
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(ClassKind::Root, 50)]
    #[test_case(ClassKind::Label, 48)]
    #[test_case(ClassKind::Neuron, 47)]
    #[test_case(ClassKind::Skeleton, 46)]
    fn class_ids_are_fixed(kind: ClassKind, expected: Id) {
        assert_eq!(kind.id(), expected);
    }

    #[test_case(RelationKind::ModelOf, 54)]
    #[test_case(RelationKind::LabeledAs, 56)]
    fn relation_ids_are_fixed(kind: RelationKind, expected: Id) {
        assert_eq!(kind.id(), expected);
    }

    #[test]
    fn names_parse_back() {
        for kind in ClassKind::ALL {
            assert_eq!(kind.name().parse::<ClassKind>(), Ok(kind));
        }
        for kind in RelationKind::ALL {
            assert_eq!(kind.name().parse::<RelationKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!("dendrite".parse::<ClassKind>().is_err());
        assert!("part_of".parse::<RelationKind>().is_err());
    }

    #[test]
    fn catalog_ids() {
        assert!(is_catalog_id(46));
        assert!(is_catalog_id(56));
        assert!(!is_catalog_id(49));
        assert!(!is_catalog_id(1));
    }
}
