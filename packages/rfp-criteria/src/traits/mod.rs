//! Core trait abstractions for the criteria pipeline.
//!
//! These traits define the interfaces that applications implement
//! to provide storage, documents, AI and research capabilities.

pub mod ai;
pub mod document;
pub mod research;
pub mod store;
