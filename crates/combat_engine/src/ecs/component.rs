//! Component trait shared by everything attached to an entity

use super::{Entity, World};
use crate::core::SimulationContext;
use crate::events::Event;

/// Component kind, used by hosts that store components heterogeneously
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Static mesh instance
    Mesh,
    /// Standalone collider
    Collider,
    /// Dynamic rigid body
    RigidDynamic,
    /// Static rigid body
    RigidStatic,
    /// Ray-cast vehicle
    Vehicle,
    /// Particle emitter
    ParticleEmitter,
    /// Power-up pickup
    PowerUp,
}

/// Lifecycle hooks the entity framework calls on every component
pub trait Component {
    /// Kind of this component
    fn component_type(&self) -> ComponentType;

    /// Called once when the component is attached to `entity`
    fn set_entity(&mut self, _entity: Entity, _world: &mut World, _ctx: &SimulationContext) {}

    /// Called for every event routed to the owning entity
    fn handle_event(&mut self, _event: &Event) {}
}
