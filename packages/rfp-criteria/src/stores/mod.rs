//! Storage implementations for the criteria pipeline.
//!
//! Available backends:
//! - `MemoryStore` - In-memory extractions and criteria
//! - `MemoryDocuments` - In-memory document source

pub mod memory;

pub use memory::{MemoryDocuments, MemoryStore};
