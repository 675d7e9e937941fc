// src/geometry/mod.rs

pub mod centroid;
pub mod roundness;

pub use centroid::{geometric_centroid, weighted_centroid};
pub use roundness::roundness;
