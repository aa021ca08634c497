//! Transformation module.
//!
//! This module handles sheet to JSON transformation:
//! - Normalize: raw cell to JSON value rules
//! - Pipeline: column validation, record building, document output

pub mod normalize;
pub mod pipeline;

pub use normalize::normalize;
pub use pipeline::*;
