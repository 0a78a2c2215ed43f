//! Domain models for tracing conversion.
//!
//! This module contains the two data models (the hierarchical NML tracing
//! and the relational CATMAID record set), the fixed class/relation catalog
//! and the identifier allocator shared by both.

/// The fixed class and relation catalog.
pub mod catalog;
pub use catalog::{ClassKind, RelationKind};

mod config;
pub use config::Config;

/// Identifier allocation.
pub mod ids;
pub use ids::{Id, IdAllocator};

/// The relational CATMAID record model.
pub mod records;
pub use records::{
    Catalog, ClassDef, Instance, InstanceLink, Record, RecordSet, RelationDef, TreeNode,
    TreeNodeLink,
};

/// The hierarchical NML tracing model.
pub mod tree;
pub use tree::{Comment, Edge, Node, Point, Thing, Tracing};
