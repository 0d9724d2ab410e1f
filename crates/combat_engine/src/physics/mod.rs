//! Physics module
//!
//! Wraps rapier3d behind a small world type and the filter, material and
//! geometry vocabulary the colliders are configured with.
//!
//! - [`PhysicsWorld`]: rigid-body sets, pipeline, scene queries and contact events
//! - [`CollisionGroupTable`]: named simulation filter groups
//! - [`QueryFilterData`]: per-collider ray-cast filter (drivable surfaces)
//! - [`MaterialLibrary`]: shared friction/restitution sets
//! - [`ColliderGeometry`]: shape descriptors owned by colliders
//! - [`PhysicsBody`] / [`Damageable`]: capabilities bodies expose to contact dispatch

pub mod body;
pub mod collision_layers;
pub mod geometry;
pub mod material;
pub mod query_filter;
pub mod world;

pub use body::{BodyContext, DamageOutcome, Damageable, PhysicsBody};
pub use collision_layers::{CollisionGroupTable, SimulationFilterData, DEFAULT_GROUP};
pub use geometry::{ColliderGeometry, ColliderType};
pub use material::{MaterialLibrary, PhysicsMaterial};
pub use query_filter::{QueryFilterData, QueryFilterType, SurfaceFlags};
pub use world::{ContactEvent, PhysicsWorld};

use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
use thiserror::Error;

/// Physics resource errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Shape parameters cannot produce a valid collision shape
    #[error("Invalid collider geometry: {0}")]
    InvalidGeometry(String),

    /// The rigid body a shape or solver refers to does not exist
    #[error("Rigid body {0:?} not found")]
    MissingBody(RigidBodyHandle),

    /// The collider referred to does not exist
    #[error("Collider {0:?} not found")]
    MissingCollider(ColliderHandle),
}
