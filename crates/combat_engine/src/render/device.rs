//! Graphics device boundary
//!
//! The simulation never talks to a graphics API directly. Components that
//! own GPU memory go through [`GraphicsDevice`]; the headless implementation
//! keeps the bookkeeping a real device would and is used by tests and the
//! demo binary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use thiserror::Error;

/// Render resource errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The device could not allocate the resource
    #[error("Buffer creation failed: {0}")]
    BufferCreation(String),

    /// An upload larger than the buffer was requested
    #[error("Upload of {requested} bytes exceeds buffer capacity of {capacity} bytes")]
    BufferOverflow {
        /// Bytes in the upload
        requested: usize,
        /// Bytes the buffer was created with
        capacity: usize,
    },

    /// The handle does not name a live resource
    #[error("Unknown buffer handle {0}")]
    UnknownBuffer(u64),
}

/// Vertex buffer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Vertex array (attribute layout) handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u64);

/// Operations the simulation needs from a graphics device
pub trait GraphicsDevice: Send + Sync {
    /// Allocate a dynamic vertex buffer of `capacity` bytes
    fn create_vertex_buffer(&self, capacity: usize) -> Result<BufferHandle, RenderError>;

    /// Describe `buffer` as an array of `stride`-byte vertices
    fn create_vertex_array(&self, buffer: BufferHandle, stride: usize) -> Result<VertexArrayHandle, RenderError>;

    /// Replace the contents of `buffer`
    fn upload(&self, buffer: BufferHandle, bytes: &[u8]) -> Result<(), RenderError>;

    /// Free a vertex array
    fn release_vertex_array(&self, handle: VertexArrayHandle);

    /// Free a vertex buffer
    fn release_buffer(&self, handle: BufferHandle);
}

#[derive(Debug, Default)]
struct HeadlessState {
    buffers: HashMap<u64, HeadlessBuffer>,
    vertex_arrays: HashMap<u64, BufferHandle>,
    releases: usize,
}

#[derive(Debug)]
struct HeadlessBuffer {
    capacity: usize,
    contents: Vec<u8>,
    uploads: usize,
}

/// Device without a GPU that records allocations and uploads
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_handle: AtomicU64,
    state: Mutex<HeadlessState>,
}

impl HeadlessDevice {
    /// Create a device with no live resources
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut HeadlessState) -> R) -> R {
        // a panic while holding the lock leaves plain bookkeeping behind, still usable
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// Number of live vertex buffers
    pub fn live_buffers(&self) -> usize {
        self.with_state(|state| state.buffers.len())
    }

    /// Number of live vertex arrays
    pub fn live_vertex_arrays(&self) -> usize {
        self.with_state(|state| state.vertex_arrays.len())
    }

    /// Total release calls received
    pub fn release_count(&self) -> usize {
        self.with_state(|state| state.releases)
    }

    /// Bytes currently stored in a buffer
    pub fn contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.with_state(|state| state.buffers.get(&buffer.0).map(|b| b.contents.clone()))
    }

    /// Number of uploads a buffer has received
    pub fn upload_count(&self, buffer: BufferHandle) -> usize {
        self.with_state(|state| state.buffers.get(&buffer.0).map_or(0, |b| b.uploads))
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_vertex_buffer(&self, capacity: usize) -> Result<BufferHandle, RenderError> {
        if capacity == 0 {
            return Err(RenderError::BufferCreation("zero-sized vertex buffer".to_string()));
        }
        let id = self.next();
        self.with_state(|state| {
            state.buffers.insert(
                id,
                HeadlessBuffer {
                    capacity,
                    contents: Vec::new(),
                    uploads: 0,
                },
            )
        });
        Ok(BufferHandle(id))
    }

    fn create_vertex_array(&self, buffer: BufferHandle, stride: usize) -> Result<VertexArrayHandle, RenderError> {
        if stride == 0 {
            return Err(RenderError::BufferCreation("zero vertex stride".to_string()));
        }
        let id = self.next();
        self.with_state(|state| {
            if !state.buffers.contains_key(&buffer.0) {
                return Err(RenderError::UnknownBuffer(buffer.0));
            }
            state.vertex_arrays.insert(id, buffer);
            Ok(VertexArrayHandle(id))
        })
    }

    fn upload(&self, buffer: BufferHandle, bytes: &[u8]) -> Result<(), RenderError> {
        self.with_state(|state| {
            let target = state
                .buffers
                .get_mut(&buffer.0)
                .ok_or(RenderError::UnknownBuffer(buffer.0))?;
            if bytes.len() > target.capacity {
                return Err(RenderError::BufferOverflow {
                    requested: bytes.len(),
                    capacity: target.capacity,
                });
            }
            target.contents.clear();
            target.contents.extend_from_slice(bytes);
            target.uploads += 1;
            Ok(())
        })
    }

    fn release_vertex_array(&self, handle: VertexArrayHandle) {
        self.with_state(|state| {
            state.releases += 1;
            if state.vertex_arrays.remove(&handle.0).is_none() {
                log::warn!("Vertex array {} released twice", handle.0);
            }
        });
    }

    fn release_buffer(&self, handle: BufferHandle) {
        self.with_state(|state| {
            state.releases += 1;
            if state.buffers.remove(&handle.0).is_none() {
                log::warn!("Vertex buffer {} released twice", handle.0);
            }
        });
    }
}
