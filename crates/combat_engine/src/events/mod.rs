//! Gameplay events raised by the simulation
//!
//! - Key-value arguments (no order dependency)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)

use std::collections::HashMap;

use crate::ecs::components::power_up::PowerUpKind;
use crate::ecs::Entity;
use crate::foundation::math::Vec3;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A vehicle's health dropped
    VehicleDamaged,
    /// A vehicle's health reached zero
    VehicleDestroyed,
    /// A vehicle fired its boost
    BoostFired,
    /// A vehicle drove through a power-up
    PowerUpCollected,
}

/// Variant for type-safe event arguments
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Entity reference
    Entity(Entity),
    /// Scalar amount (damage, health, power-up value)
    Amount(f32),
    /// Power-up kind
    PowerUp(PowerUpKind),
    /// Direction vector
    Direction(Vec3),
}

/// Event with type ID and key-value arguments
#[derive(Debug, Clone)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Simulation time when the event was raised (seconds)
    pub timestamp: f64,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create a new event with the given type and timestamp
    pub fn new(event_type: EventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
            args: HashMap::new(),
        }
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Add an entity argument if one is known
    pub fn with_entity(self, key: &'static str, entity: Option<Entity>) -> Self {
        match entity {
            Some(entity) => self.with_arg(key, EventArg::Entity(entity)),
            None => self,
        }
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get an entity argument if present
    pub fn get_entity(&self, key: &str) -> Option<Entity> {
        if let Some(EventArg::Entity(entity)) = self.get_arg(key) {
            Some(*entity)
        } else {
            None
        }
    }

    /// Get the `amount` argument if present
    pub fn get_amount(&self) -> Option<f32> {
        if let Some(EventArg::Amount(amount)) = self.get_arg("amount") {
            Some(*amount)
        } else {
            None
        }
    }

    /// Get the `power_up` argument if present
    pub fn get_power_up(&self) -> Option<PowerUpKind> {
        if let Some(EventArg::PowerUp(kind)) = self.get_arg("power_up") {
            Some(*kind)
        } else {
            None
        }
    }

    /// Get the `direction` argument if present
    pub fn get_direction(&self) -> Option<Vec3> {
        if let Some(EventArg::Direction(direction)) = self.get_arg("direction") {
            Some(*direction)
        } else {
            None
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Event system with handler registration
pub struct EventSystem {
    queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a specific event type
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Queue a batch of events, e.g. those drained from a simulation step
    pub fn send_all(&mut self, events: impl IntoIterator<Item = Event>) {
        self.queue.extend(events);
    }

    /// Number of events waiting for dispatch
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch all pending events in send order
    pub fn dispatch(&mut self) {
        let queue = std::mem::take(&mut self.queue);
        for event in queue {
            if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
                for handler in handlers.iter_mut() {
                    if handler.on_event(&event) {
                        break;
                    }
                }
            }
        }
    }

    /// Drop queued events without delivering them
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}
