//! Minimal entity/component framework
//!
//! Hosts the gameplay components: entities own a root transform in the
//! scene graph and components receive lifecycle hooks through [`Component`].

pub mod component;
pub mod components;
pub mod entity;
pub mod world;

pub use component::{Component, ComponentType};
pub use entity::Entity;
pub use world::World;
