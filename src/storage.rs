//! File formats.
//!
//! Each format module offers a `from_str`/`to_string` pair translating
//! between text and one of the domain models, and its own error type.

/// CATMAID JSON exports.
pub mod catmaid;

/// KNOSSOS and PyKNOSSOS NML documents.
pub mod nml;

pub use catmaid::Boilerplate;
pub use nml::Flavor;
