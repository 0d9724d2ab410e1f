//! Debug module for inspecting live simulation state
//!
//! Components render themselves into a [`DebugUi`] so any immediate-mode
//! GUI can host the inspector.

pub mod inspector;

pub use inspector::{DebugUi, RecordingUi, ScriptedEdit};
