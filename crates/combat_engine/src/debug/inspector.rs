//! Immediate-mode inspection of live simulation state
//!
//! Components draw themselves into a [`DebugUi`]; a GUI backend implements
//! the trait on top of its widgets. [`RecordingUi`] is a headless
//! implementation that logs every widget and can replay scripted edits.

use std::collections::HashMap;

use crate::foundation::math::{utils, Quat, Transform, Vec3};

/// Widgets available to inspectors
pub trait DebugUi {
    /// Read-only `name: value` row
    fn label(&mut self, name: &str, value: &str);

    /// Free text row
    fn text(&mut self, text: &str);

    /// Editable vector; returns true if the value changed
    fn edit_vec3(&mut self, name: &str, value: &mut Vec3) -> bool;

    /// Editable scalar; returns true if the value changed
    fn edit_f32(&mut self, name: &str, value: &mut f32) -> bool;

    /// Open a collapsible node; when true the caller draws the children and calls [`DebugUi::tree_pop`]
    fn tree_node(&mut self, name: &str) -> bool;

    /// Close the node opened by the last successful [`DebugUi::tree_node`]
    fn tree_pop(&mut self);
}

/// Value a scripted edit writes into a widget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedEdit {
    /// For `edit_vec3`
    Vec3(Vec3),
    /// For `edit_f32`
    F32(f32),
}

/// Headless [`DebugUi`] that records drawn rows
#[derive(Debug, Default)]
pub struct RecordingUi {
    lines: Vec<String>,
    depth: usize,
    edits: HashMap<String, ScriptedEdit>,
    closed_nodes: Vec<String>,
}

impl RecordingUi {
    /// Create an empty recorder with every node open
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: the next widget drawn with `name` receives `edit`
    pub fn with_edit(mut self, name: &str, edit: ScriptedEdit) -> Self {
        self.edits.insert(name.to_string(), edit);
        self
    }

    /// Builder pattern: report the named node as collapsed
    pub fn with_closed_node(mut self, name: &str) -> Self {
        self.closed_nodes.push(name.to_string());
        self
    }

    /// Rows drawn so far, indented by tree depth
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether some row contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    fn push(&mut self, row: String) {
        self.lines.push(format!("{}{}", "  ".repeat(self.depth), row));
    }
}

impl DebugUi for RecordingUi {
    fn label(&mut self, name: &str, value: &str) {
        self.push(format!("{}: {}", name, value));
    }

    fn text(&mut self, text: &str) {
        self.push(text.to_string());
    }

    fn edit_vec3(&mut self, name: &str, value: &mut Vec3) -> bool {
        let changed = match self.edits.remove(name) {
            Some(ScriptedEdit::Vec3(new_value)) => {
                *value = new_value;
                true
            }
            _ => false,
        };
        self.push(format!("{}: [{:.3}, {:.3}, {:.3}]", name, value.x, value.y, value.z));
        changed
    }

    fn edit_f32(&mut self, name: &str, value: &mut f32) -> bool {
        let changed = match self.edits.remove(name) {
            Some(ScriptedEdit::F32(new_value)) => {
                *value = new_value;
                true
            }
            _ => false,
        };
        self.push(format!("{}: {:.3}", name, value));
        changed
    }

    fn tree_node(&mut self, name: &str) -> bool {
        self.push(format!("> {}", name));
        if self.closed_nodes.iter().any(|closed| closed == name) {
            return false;
        }
        self.depth += 1;
        true
    }

    fn tree_pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl Transform {
    /// Edit position, rotation (Euler degrees) and scale; true if anything changed
    pub fn render_debug_gui(&mut self, ui: &mut dyn DebugUi) -> bool {
        let mut changed = ui.edit_vec3("Position", &mut self.position);

        let (roll, pitch, yaw) = self.rotation.euler_angles();
        let mut euler = Vec3::new(utils::rad_to_deg(roll), utils::rad_to_deg(pitch), utils::rad_to_deg(yaw));
        if ui.edit_vec3("Rotation", &mut euler) {
            self.rotation = Quat::from_euler_angles(
                utils::deg_to_rad(euler.x),
                utils::deg_to_rad(euler.y),
                utils::deg_to_rad(euler.z),
            );
            changed = true;
        }

        changed |= ui.edit_vec3("Scale", &mut self.scale);
        changed
    }
}
