//! Data types for the criteria pipeline.

pub mod config;
pub mod criterion;
pub mod document;
pub mod extraction;
pub mod validation;
