//! Power-up pickups
//!
//! A pickup is a static trigger volume in the `PowerUps` collision group.
//! The first vehicle to overlap it takes the power-up; afterwards the pickup
//! reports itself consumed and is removed by the simulation.

use rapier3d::prelude::RigidBodyHandle;

use super::collider::Collider;
use super::rigid_dynamic::RigidDynamicComponent;
use crate::config::ConfigDocument;
use crate::core::SimulationContext;
use crate::ecs::{Component, ComponentType, Entity, World};
use crate::physics::{ColliderGeometry, PhysicsBody, PhysicsError, PhysicsWorld, QueryFilterType};
use crate::scene::{SceneGraph, TransformKey};

/// Collision group pickups are placed in
pub const POWER_UP_GROUP: &str = "PowerUps";

/// What a power-up changes on the vehicle that collects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    /// Scales engine force
    Speed,
    /// Scales incoming damage
    Defence,
    /// Replaces contact damage
    Damage,
    /// Restores health instantly
    Health,
}

impl PowerUpKind {
    /// Content-file name
    pub fn name(self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::Defence => "Defence",
            Self::Damage => "Damage",
            Self::Health => "Health",
        }
    }

    /// Parse a content-file name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Speed" => Some(Self::Speed),
            "Defence" => Some(Self::Defence),
            "Damage" => Some(Self::Damage),
            "Health" => Some(Self::Health),
            _ => None,
        }
    }

    /// Magnitude used when a content file gives none
    pub fn default_value(self) -> f32 {
        match self {
            Self::Speed => 1.5,
            Self::Defence => 0.5,
            Self::Damage => 2.0,
            Self::Health => 250.0,
        }
    }
}

/// A power-up and its magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUp {
    /// Effect
    pub kind: PowerUpKind,
    /// Multiplier, damage or health amount depending on `kind`
    pub value: f32,
}

impl PowerUp {
    /// Power-up with the kind's default magnitude
    pub fn new(kind: PowerUpKind) -> Self {
        Self {
            kind,
            value: kind.default_value(),
        }
    }
}

/// Trigger volume granting a [`PowerUp`] once
#[derive(Debug, Clone)]
pub struct PowerUpComponent {
    power_up: PowerUp,
    body: RigidDynamicComponent,
    consumed: bool,
}

impl PowerUpComponent {
    /// Pickup with a spherical trigger of `radius`
    pub fn new(power_up: PowerUp, radius: f32, physics: &PhysicsWorld) -> Self {
        let trigger = Collider::new(
            POWER_UP_GROUP,
            physics.materials().get("Default"),
            QueryFilterType::NonDrivableSurface.filter_data(),
            ColliderGeometry::Sphere { radius },
        );
        Self {
            power_up,
            body: RigidDynamicComponent::new_static().with_collider(trigger),
            consumed: false,
        }
    }

    /// Read a pickup document: `Type`, `Value`, `Radius`
    pub fn from_config(doc: &ConfigDocument, physics: &PhysicsWorld) -> Self {
        let type_name = doc.str_or("Type", "Speed");
        let kind = PowerUpKind::from_name(&type_name).unwrap_or_else(|| {
            log::debug!("Unknown power-up type '{}', using Speed", type_name);
            PowerUpKind::Speed
        });
        let power_up = PowerUp {
            kind,
            value: doc.get_or("Value", kind.default_value()),
        };
        Self::new(power_up, doc.get_or("Radius", 1.0), physics)
    }

    /// Whether a vehicle already collected this pickup
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Trigger shapes
    pub fn colliders(&self) -> &[Collider] {
        self.body.colliders()
    }

    /// Scene node of the pickup
    pub fn transform_key(&self) -> Option<TransformKey> {
        self.body.transform_key()
    }

    /// Create the trigger actor at the pose of `transform`
    pub fn create_actor(
        &mut self,
        physics: &mut PhysicsWorld,
        scene: &SceneGraph,
        transform: TransformKey,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        self.body.create_actor(physics, scene, transform)
    }

    /// Remove the trigger from the world
    pub fn release(&mut self, physics: &mut PhysicsWorld) {
        self.body.release(physics);
    }
}

impl PhysicsBody for PowerUpComponent {
    fn body_handle(&self) -> Option<RigidBodyHandle> {
        self.body.body_handle()
    }

    fn entity(&self) -> Option<Entity> {
        self.body.entity()
    }

    fn power_up(&self) -> Option<PowerUp> {
        (!self.consumed).then_some(self.power_up)
    }

    fn consume_power_up(&mut self) -> Option<PowerUp> {
        let power_up = self.power_up()?;
        self.consumed = true;
        Some(power_up)
    }
}

impl Component for PowerUpComponent {
    fn component_type(&self) -> ComponentType {
        ComponentType::PowerUp
    }

    fn set_entity(&mut self, entity: Entity, world: &mut World, ctx: &SimulationContext) {
        self.body.set_entity(entity, world, ctx);
    }
}
