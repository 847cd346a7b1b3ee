//! Reader and writer for `.construction` container files.
//!
//! A container holds a list of dimensions, a bounding selection and a table
//! of chunk payloads. [`ConstructionOpener`] plugs the reader into
//! [`quarry_import::ImportPipeline`]; [`ConstructionWriter`] produces files.

mod codec;
mod error;
mod header;
mod reader;
mod writer;

pub use error::ConstructionError;
pub use header::{FORMAT_VERSION, MAGIC};
pub use reader::{ConstructionOpener, ConstructionReader};
pub use writer::ConstructionWriter;
