//! ECS Components module
//!
//! Gameplay components attached to entities: physics facets, mesh
//! instances, particle emitters, pickups and the ray-cast vehicle.

pub mod collider;
pub mod mesh;
pub mod particle_emitter;
pub mod power_up;
pub mod rigid_dynamic;
pub mod vehicle;

pub use collider::Collider;
pub use mesh::{MeshAsset, MeshComponent};
pub use particle_emitter::{EmitterSettings, ParticleEmitterComponent, MAX_PARTICLES};
pub use power_up::{PowerUp, PowerUpComponent, PowerUpKind};
pub use rigid_dynamic::RigidDynamicComponent;
pub use vehicle::{VehicleAssets, VehicleComponent, VehicleError};
