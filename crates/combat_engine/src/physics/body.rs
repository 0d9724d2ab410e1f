//! Capabilities a simulated body exposes to contact dispatch
//!
//! Contact and trigger handlers receive the other body as `&mut dyn PhysicsBody`
//! and probe it for capabilities (`as_damageable`, `power_up`) instead of
//! inspecting its concrete type.

use rapier3d::prelude::RigidBodyHandle;

use super::PhysicsWorld;
use crate::core::SimulationContext;
use crate::ecs::components::power_up::PowerUp;
use crate::ecs::Entity;
use crate::events::Event;
use crate::scene::SceneGraph;

/// State shared with contact and trigger handlers
pub struct BodyContext<'a> {
    /// Clock of the current step
    pub sim: &'a SimulationContext,
    /// Scene graph (read-only during dispatch)
    pub scene: &'a SceneGraph,
    /// Outgoing gameplay events
    pub events: &'a mut Vec<Event>,
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// Health actually removed
    pub applied: f32,
    /// This hit brought health to zero
    pub destroyed: bool,
}

/// Anything that can take damage
pub trait Damageable {
    /// Apply `damage`; the receiver scales it by its own resistance
    fn take_damage(&mut self, damager: Option<Entity>, damage: f32, ctx: &mut BodyContext<'_>) -> DamageOutcome;

    /// Current health
    fn health(&self) -> f32;
}

/// A body registered with the physics world
pub trait PhysicsBody {
    /// Rigid body handle, if the actor exists
    fn body_handle(&self) -> Option<RigidBodyHandle>;

    /// Owning entity
    fn entity(&self) -> Option<Entity> {
        None
    }

    /// Pull the simulated pose into the scene after a physics step
    fn update_from_physics(&mut self, _physics: &mut PhysicsWorld, _scene: &mut SceneGraph) {}

    /// A solid contact with `other` started
    fn on_contact(&mut self, _other: &mut dyn PhysicsBody, _ctx: &mut BodyContext<'_>) {}

    /// `other` entered one of this body's trigger shapes
    fn on_trigger(&mut self, _other: &mut dyn PhysicsBody, _ctx: &mut BodyContext<'_>) {}

    /// Damage capability
    fn as_damageable(&mut self) -> Option<&mut dyn Damageable> {
        None
    }

    /// Power-up this body grants on pickup, if any is still available
    fn power_up(&self) -> Option<PowerUp> {
        None
    }

    /// Take the power-up; later calls return `None`
    fn consume_power_up(&mut self) -> Option<PowerUp> {
        None
    }
}
