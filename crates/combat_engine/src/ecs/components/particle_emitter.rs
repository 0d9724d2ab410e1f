//! Particle emitter component
//!
//! Point-sprite particles spawned in a cone around the emitter's forward
//! axis, integrated under constant acceleration and uploaded to a
//! GPU-resident vertex buffer when sorted for drawing.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ConfigDocument;
use crate::core::SimulationContext;
use crate::debug::DebugUi;
use crate::ecs::{Component, ComponentType, Entity, World};
use crate::foundation::math::{axes, constants, utils, Mat4, Point3, Quat, Transform, Unit, Vec2, Vec3, Vec4};
use crate::foundation::time::Time;
use crate::render::{GraphicsDevice, Particle, ParticleBuffers, RenderError};
use crate::scene::{SceneGraph, TransformKey};

/// Hard cap on live particles per emitter
pub const MAX_PARTICLES: usize = 500;

/// Emission and appearance parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterSettings {
    /// Particles emitted when attached to an entity
    pub emit_on_spawn: usize,
    /// Particles emitted per spawn tick
    pub emit_count: usize,
    /// Minimum angle from forward, radians
    pub emit_cone_min_angle: f32,
    /// Maximum angle from forward, radians
    pub emit_cone_max_angle: f32,
    /// Semi-axes of the spawn ellipsoid
    pub emit_scale: Vec3,
    /// Positions are stored relative to the emitter instead of in world space
    pub locked_to_entity: bool,
    /// Speed of new particles
    pub initial_speed: f32,
    /// Constant acceleration
    pub acceleration: Vec3,
    /// Sprite size at spawn
    pub initial_scale: Vec2,
    /// Sprite size at death
    pub final_scale: Vec2,
    /// Texture asset name
    pub texture: String,
    /// Colour at spawn
    pub initial_color: Vec4,
    /// Colour at death
    pub final_color: Vec4,
    /// Emissive strength
    pub emissiveness: f32,
    /// Texture is a sprite sheet
    pub is_sprite: bool,
    /// Sprite sheet columns
    pub sprite_columns: u32,
    /// Sprite sheet rows
    pub sprite_rows: u32,
    /// Size of one sprite cell in pixels
    pub sprite_size: Vec2,
    /// Sprite animation loops over a particle's life
    pub animation_cycles: f32,
    /// Seconds a particle lives
    pub lifetime: f64,
    /// Seconds between spawn ticks; zero or less disables spawning
    pub spawn_rate: f64,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            emit_on_spawn: 0,
            emit_count: 1,
            emit_cone_min_angle: 0.0,
            emit_cone_max_angle: utils::deg_to_rad(90.0),
            emit_scale: Vec3::zeros(),
            locked_to_entity: false,
            initial_speed: 10.0,
            acceleration: Vec3::new(0.0, -9.81, 0.0),
            initial_scale: Vec2::new(1.0, 1.0),
            final_scale: Vec2::new(1.0, 1.0),
            texture: "Particles/Explosion.png".to_string(),
            initial_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            final_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            emissiveness: 0.0,
            is_sprite: false,
            sprite_columns: 1,
            sprite_rows: 1,
            sprite_size: Vec2::new(10.0, 10.0),
            animation_cycles: 2.0,
            lifetime: 3.0,
            spawn_rate: 0.1,
        }
    }
}

impl EmitterSettings {
    /// Read an emitter document; angles are given in degrees
    pub fn from_config(doc: &ConfigDocument) -> Self {
        let defaults = Self::default();
        Self {
            emit_on_spawn: doc.get_or("EmitOnSpawn", defaults.emit_on_spawn),
            emit_count: doc.get_or("EmitCount", defaults.emit_count),
            emit_cone_min_angle: utils::deg_to_rad(doc.get_or("EmitConeMinAngle", 0.0)),
            emit_cone_max_angle: utils::deg_to_rad(doc.get_or("EmitConeMaxAngle", 90.0)),
            emit_scale: doc.vec3_or("EmitScale", defaults.emit_scale),
            locked_to_entity: doc.get_or("LockedToEntity", defaults.locked_to_entity),
            initial_speed: doc.get_or("InitialSpeed", defaults.initial_speed),
            acceleration: doc.vec3_or("Acceleration", defaults.acceleration),
            initial_scale: doc.vec2_or("InitialScale", defaults.initial_scale),
            final_scale: doc.vec2_or("FinalScale", defaults.final_scale),
            texture: doc.str_or("Texture", &defaults.texture),
            initial_color: doc.color_or("InitialColor", defaults.initial_color),
            final_color: doc.color_or("FinalColor", defaults.final_color),
            emissiveness: doc.get_or("Emissiveness", defaults.emissiveness),
            is_sprite: doc.get_or("IsSprite", defaults.is_sprite),
            sprite_columns: doc.get_or("SpriteColumns", defaults.sprite_columns),
            sprite_rows: doc.get_or("SpriteRows", defaults.sprite_rows),
            sprite_size: doc.vec2_or("SpriteSize", defaults.sprite_size),
            animation_cycles: doc.get_or("AnimationCycles", defaults.animation_cycles),
            lifetime: doc.get_or("Lifetime", defaults.lifetime),
            spawn_rate: doc.get_or("SpawnRate", defaults.spawn_rate),
        }
    }
}

/// Pool of particles backed by GPU vertex storage
pub struct ParticleEmitterComponent {
    settings: EmitterSettings,
    local: Transform,
    transform: Option<TransformKey>,
    entity: Option<Entity>,
    particles: Vec<Particle>,
    buffers: ParticleBuffers,
    next_spawn: Option<Time>,
    rng: SmallRng,
}

impl ParticleEmitterComponent {
    /// Create an emitter and its vertex storage
    pub fn new(settings: EmitterSettings, device: Arc<dyn GraphicsDevice>) -> Result<Self, RenderError> {
        Ok(Self {
            settings,
            local: Transform::identity(),
            transform: None,
            entity: None,
            particles: Vec::with_capacity(MAX_PARTICLES),
            buffers: ParticleBuffers::new(device, MAX_PARTICLES)?,
            next_spawn: None,
            rng: SmallRng::from_entropy(),
        })
    }

    /// Read an emitter document, including its `Position`/`Rotation`/`Scale`
    pub fn from_config(doc: &ConfigDocument, device: Arc<dyn GraphicsDevice>) -> Result<Self, RenderError> {
        let local = Transform::from_euler_degrees(
            doc.vec3_or("Position", Vec3::zeros()),
            doc.vec3_or("Rotation", Vec3::zeros()),
            doc.vec3_or("Scale", Vec3::new(1.0, 1.0, 1.0)),
        );
        Ok(Self::new(EmitterSettings::from_config(doc), device)?.with_local(local))
    }

    /// Builder pattern: deterministic sampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Builder pattern: transform relative to the parent node
    pub fn with_local(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    /// Emission parameters
    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    /// Mutable emission parameters
    pub fn settings_mut(&mut self) -> &mut EmitterSettings {
        &mut self.settings
    }

    /// Live particles
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// GPU storage handed to the renderer
    pub fn buffers(&self) -> &ParticleBuffers {
        &self.buffers
    }

    /// Scene node, once attached
    pub fn transform_key(&self) -> Option<TransformKey> {
        self.transform
    }

    /// Place the emitter under `parent` (or at the root)
    pub fn attach(&mut self, scene: &mut SceneGraph, parent: Option<TransformKey>) -> TransformKey {
        if let Some(old) = self.transform.take() {
            scene.remove(old);
        }
        let key = match parent {
            Some(parent) => scene.insert_child(parent, self.local),
            None => scene.insert(self.local),
        };
        self.transform = Some(key);
        key
    }

    /// Remove the emitter's node from the scene
    pub fn detach(&mut self, scene: &mut SceneGraph) {
        if let Some(key) = self.transform.take() {
            scene.remove(key);
        }
    }

    /// Transform relative to the parent node
    pub fn local_transform(&self) -> Transform {
        self.local
    }

    /// Move the emitter relative to its parent
    pub fn set_local_transform(&mut self, scene: &mut SceneGraph, local: Transform) {
        self.local = local;
        if let Some(key) = self.transform {
            scene.set_local(key, local);
        }
    }

    /// World transform of the emitter
    pub fn global_transform(&self, scene: &SceneGraph) -> Transform {
        self.transform
            .and_then(|key| scene.global(key))
            .unwrap_or(self.local)
    }

    /// Matrix particle positions are multiplied by when drawn
    pub fn model_matrix(&self, scene: &SceneGraph) -> Mat4 {
        if self.settings.locked_to_entity {
            self.global_transform(scene).to_matrix()
        } else {
            Mat4::identity()
        }
    }

    /// Age, integrate and drop expired particles, then run spawn-rate emission
    pub fn update(&mut self, ctx: &SimulationContext, scene: &SceneGraph) {
        let delta = ctx.delta;
        let lifetime = self.settings.lifetime as f32;
        let acceleration = self.settings.acceleration;

        self.particles.retain(|particle| particle.age <= lifetime);
        for particle in &mut self.particles {
            let velocity = particle.velocity() + acceleration * delta;
            particle.velocity = velocity.into();
            particle.position = (particle.position() + velocity * delta).into();
            particle.age += delta;
        }

        if self.settings.spawn_rate <= 0.0 {
            return;
        }
        let next_spawn = *self.next_spawn.get_or_insert(ctx.time + self.settings.spawn_rate);
        if ctx.time >= next_spawn {
            self.next_spawn = Some(ctx.time + self.settings.spawn_rate);
            self.emit(self.settings.emit_count, scene);
        }
    }

    /// Add one particle at a local offset; no-op at capacity
    pub fn add_particle(&mut self, offset: Vec3, velocity: Vec3, scene: &SceneGraph) -> bool {
        if self.particles.len() >= MAX_PARTICLES {
            log::trace!("Particle emitter at capacity ({})", MAX_PARTICLES);
            return false;
        }
        let position = if self.settings.locked_to_entity {
            offset
        } else {
            offset + self.global_transform(scene).position
        };
        self.particles.push(Particle::new(position, velocity));
        true
    }

    /// Emit up to `count` particles; returns how many were added
    pub fn emit(&mut self, count: usize, scene: &SceneGraph) -> usize {
        let count = count.min(MAX_PARTICLES - self.particles.len());
        if count == 0 {
            return 0;
        }

        // locked particles live in emitter space, so their cone is the local forward
        let forward = if self.settings.locked_to_entity {
            axes::forward()
        } else {
            self.global_transform(scene).forward().normalize()
        };
        let cross = axes::up().cross(&forward);
        let cross = if cross.norm() <= f32::EPSILON { axes::right() } else { cross.normalize() };
        let (min_angle, max_angle) = (self.settings.emit_cone_min_angle, self.settings.emit_cone_max_angle);

        for _ in 0..count {
            let azimuth = self.rng.gen_range(0.0..constants::TAU);
            let polar = utils::lerp(min_angle, max_angle, self.rng.gen::<f32>());

            let around_forward = Quat::from_axis_angle(&Unit::new_unchecked(forward), azimuth);
            let around_cross = Quat::from_axis_angle(&Unit::new_unchecked(cross), polar);
            let direction = (around_forward * around_cross * forward).normalize();

            let offset = self.sample_ellipsoid();
            self.add_particle(offset, direction * self.settings.initial_speed, scene);
        }
        count
    }

    fn sample_ellipsoid(&mut self) -> Vec3 {
        for _ in 0..32 {
            let candidate = Vec3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            );
            if candidate.norm_squared() <= 1.0 {
                return self.settings.emit_scale.component_mul(&candidate);
            }
        }
        Vec3::zeros()
    }

    /// Point every live particle along `direction`, keeping its speed
    pub fn set_directions(&mut self, direction: Vec3) {
        for particle in &mut self.particles {
            let speed = particle.velocity().norm();
            particle.velocity = (direction * speed).into();
        }
    }

    /// Order particles back to front as seen from `camera_position` and upload them
    pub fn sort(&mut self, camera_position: Vec3, scene: &SceneGraph) -> Result<(), RenderError> {
        let camera = if self.settings.locked_to_entity {
            self.global_transform(scene).inverse().transform_point(Point3::from(camera_position)).coords
        } else {
            camera_position
        };

        self.particles.sort_by(|a, b| {
            let da = (a.position() - camera).norm_squared();
            let db = (b.position() - camera).norm_squared();
            db.total_cmp(&da)
        });
        self.buffers.upload(&self.particles)
    }

    /// Inspect and tune emission
    pub fn render_debug_gui(&mut self, ui: &mut dyn DebugUi) {
        ui.label("Particles", &format!("{} / {}", self.particles.len(), MAX_PARTICLES));
        ui.label("Texture", &self.settings.texture);

        let mut min_angle = utils::rad_to_deg(self.settings.emit_cone_min_angle);
        if ui.edit_f32("Cone Min Angle", &mut min_angle) {
            self.settings.emit_cone_min_angle = utils::deg_to_rad(min_angle);
        }
        let mut max_angle = utils::rad_to_deg(self.settings.emit_cone_max_angle);
        if ui.edit_f32("Cone Max Angle", &mut max_angle) {
            self.settings.emit_cone_max_angle = utils::deg_to_rad(max_angle);
        }
        ui.edit_vec3("Emit Scale", &mut self.settings.emit_scale);
        ui.edit_f32("Initial Speed", &mut self.settings.initial_speed);
        ui.edit_vec3("Acceleration", &mut self.settings.acceleration);

        let mut lifetime = self.settings.lifetime as f32;
        if ui.edit_f32("Lifetime", &mut lifetime) {
            self.settings.lifetime = f64::from(lifetime.max(0.0));
        }
        let mut spawn_rate = self.settings.spawn_rate as f32;
        if ui.edit_f32("Spawn Rate", &mut spawn_rate) {
            self.settings.spawn_rate = f64::from(spawn_rate);
        }
    }
}

impl std::fmt::Debug for ParticleEmitterComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleEmitterComponent")
            .field("settings", &self.settings)
            .field("transform", &self.transform)
            .field("particles", &self.particles.len())
            .finish()
    }
}

impl Component for ParticleEmitterComponent {
    fn component_type(&self) -> ComponentType {
        ComponentType::ParticleEmitter
    }

    fn set_entity(&mut self, entity: Entity, world: &mut World, ctx: &SimulationContext) {
        self.entity = Some(entity);
        let parent = world.transform_key(entity);
        self.attach(&mut world.scene, parent);
        self.next_spawn = Some(ctx.time + self.settings.spawn_rate);
        self.emit(self.settings.emit_on_spawn, &world.scene);
    }
}
