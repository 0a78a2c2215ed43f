//! Neuron skeleton tracing conversion.
//!
//! Converts tracings between the hierarchical NML format written by KNOSSOS
//! and PyKNOSSOS and the relational JSON export of CATMAID, preserving node
//! ids, edges, coordinates and comments across a round trip.

pub mod convert;
pub use convert::{ConvertError, Fault, to_records, to_records_with, to_tracing};

pub mod domain;
pub use domain::{Config, IdAllocator, RecordSet, Tracing};

/// Reading and writing NML and CATMAID documents.
pub mod storage;
pub use storage::{Boilerplate, Flavor};
