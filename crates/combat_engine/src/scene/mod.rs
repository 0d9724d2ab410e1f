//! Scene management
//!
//! Hierarchical transforms shared by entities, physics facets, mesh
//! instances and particle emitters.

pub mod scene_graph;

pub use scene_graph::{SceneGraph, TransformKey};
