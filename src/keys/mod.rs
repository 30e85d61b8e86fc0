//! Key material: opaque identifier generation.

pub mod generator;
