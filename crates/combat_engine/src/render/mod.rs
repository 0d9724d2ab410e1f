//! Rendering boundary
//!
//! GPU resources owned by simulation components. Drawing itself happens
//! outside this crate; renderers read handles and matrices from here.

pub mod device;
pub mod particle_buffer;

pub use device::{BufferHandle, GraphicsDevice, HeadlessDevice, RenderError, VertexArrayHandle};
pub use particle_buffer::{Particle, ParticleBuffers};
