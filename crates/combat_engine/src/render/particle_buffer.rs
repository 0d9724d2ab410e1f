//! GPU storage for particle vertices

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use super::device::{BufferHandle, GraphicsDevice, RenderError, VertexArrayHandle};
use crate::foundation::math::Vec3;

/// A live particle, uploaded verbatim as one point-sprite vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position (emitter-local or world space)
    pub position: [f32; 3],
    /// Velocity
    pub velocity: [f32; 3],
    /// Seconds since spawn
    pub age: f32,
}

impl Particle {
    /// Create a particle with zero age
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position: position.into(),
            velocity: velocity.into(),
            age: 0.0,
        }
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Velocity as a vector
    pub fn velocity(&self) -> Vec3 {
        Vec3::from(self.velocity)
    }
}

/// Vertex buffer plus vertex array sized for a fixed particle capacity.
///
/// Exclusively owned; both handles go back to the device exactly once, on drop.
pub struct ParticleBuffers {
    device: Arc<dyn GraphicsDevice>,
    vertex_buffer: BufferHandle,
    vertex_array: VertexArrayHandle,
    capacity: usize,
}

impl ParticleBuffers {
    /// Allocate storage for `capacity` particles
    pub fn new(device: Arc<dyn GraphicsDevice>, capacity: usize) -> Result<Self, RenderError> {
        let stride = std::mem::size_of::<Particle>();
        let vertex_buffer = device.create_vertex_buffer(capacity * stride)?;
        let vertex_array = match device.create_vertex_array(vertex_buffer, stride) {
            Ok(vertex_array) => vertex_array,
            Err(err) => {
                device.release_buffer(vertex_buffer);
                return Err(err);
            }
        };

        Ok(Self {
            device,
            vertex_buffer,
            vertex_array,
            capacity,
        })
    }

    /// Replace the buffer contents with `particles`
    pub fn upload(&self, particles: &[Particle]) -> Result<(), RenderError> {
        self.device.upload(self.vertex_buffer, bytemuck::cast_slice(particles))
    }

    /// Vertex buffer handle
    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    /// Vertex array handle
    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }

    /// Particle capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for ParticleBuffers {
    fn drop(&mut self) {
        self.device.release_vertex_array(self.vertex_array);
        self.device.release_buffer(self.vertex_buffer);
    }
}

impl std::fmt::Debug for ParticleBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleBuffers")
            .field("vertex_buffer", &self.vertex_buffer)
            .field("vertex_array", &self.vertex_array)
            .field("capacity", &self.capacity)
            .finish()
    }
}
