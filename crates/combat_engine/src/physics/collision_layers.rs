//! Collision group table for filtering contact generation
//!
//! Colliders name their group ("Vehicles", "Ground", ...). The table maps
//! each name to a membership bit plus a mask of the groups it collides with,
//! and that pair becomes the collider's simulation filter data.

use std::collections::HashMap;

use rapier3d::prelude::{Group, InteractionGroups};

use crate::core::config::{default_collision_groups, CollisionGroupConfig};

/// Name of the group unknown names fall back to
pub const DEFAULT_GROUP: &str = "Default";

/// Simulation filter data derived from a collision group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationFilterData {
    /// Membership bit of the group
    pub membership: u32,
    /// Groups this one generates contacts with
    pub mask: u32,
    /// Overlap-only group
    pub trigger: bool,
}

impl SimulationFilterData {
    /// Matches everything
    pub const ALL: Self = Self {
        membership: u32::MAX,
        mask: u32::MAX,
        trigger: false,
    };

    /// Check if two filters should collide: each must be in the other's mask
    pub fn should_collide(&self, other: &SimulationFilterData) -> bool {
        (self.membership & other.mask) != 0 && (other.membership & self.mask) != 0
    }

    /// Rapier interaction groups for collision and solver filtering
    pub fn interaction_groups(&self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.membership),
            Group::from_bits_truncate(self.mask),
        )
    }
}

/// Named collision-group table shared by all colliders
#[derive(Debug, Clone)]
pub struct CollisionGroupTable {
    filters: HashMap<String, SimulationFilterData>,
    names: Vec<String>,
}

impl Default for CollisionGroupTable {
    fn default() -> Self {
        Self::from_config(&default_collision_groups())
    }
}

impl CollisionGroupTable {
    /// Build the table. Entries past the 32nd and references to unknown
    /// groups are skipped with a warning; a missing `Default` group is added
    /// colliding with everything.
    pub fn from_config(groups: &[CollisionGroupConfig]) -> Self {
        let mut bits: HashMap<&str, u32> = HashMap::new();
        let mut names = Vec::new();
        let mut accepted = Vec::new();
        for group in groups {
            if bits.contains_key(group.name.as_str()) {
                log::warn!("Duplicate collision group '{}' ignored", group.name);
                continue;
            }
            if names.len() == 32 {
                log::warn!("Collision group '{}' exceeds the 32 group limit", group.name);
                continue;
            }
            bits.insert(group.name.as_str(), 1 << names.len());
            names.push(group.name.clone());
            accepted.push(group);
        }

        let mut masks: HashMap<&str, u32> = bits.keys().map(|name| (*name, 0)).collect();
        for group in &accepted {
            let own_bit = bits[group.name.as_str()];
            for other in &group.collides_with {
                let Some(&other_bit) = bits.get(other.as_str()) else {
                    log::warn!("Collision group '{}' references unknown group '{}'", group.name, other);
                    continue;
                };
                // pairs are symmetric regardless of which side listed them
                *masks.entry(group.name.as_str()).or_default() |= other_bit;
                *masks.entry(other.as_str()).or_default() |= own_bit;
            }
        }

        // only the first definition of a name counts
        let mut filters: HashMap<String, SimulationFilterData> = accepted
            .iter()
            .map(|group| {
                let membership = bits[group.name.as_str()];
                let mask = masks.get(group.name.as_str()).copied().unwrap_or(0);
                (group.name.clone(), SimulationFilterData { membership, mask, trigger: group.trigger })
            })
            .collect();

        if !filters.contains_key(DEFAULT_GROUP) {
            log::warn!("Collision table has no '{}' group, adding a catch-all", DEFAULT_GROUP);
            filters.insert(DEFAULT_GROUP.to_string(), SimulationFilterData::ALL);
            names.push(DEFAULT_GROUP.to_string());
        }

        Self { filters, names }
    }

    /// Filter data for a group name; unknown names use the `Default` group
    pub fn filter(&self, name: &str) -> SimulationFilterData {
        match self.filters.get(name) {
            Some(filter) => *filter,
            None => {
                log::debug!("Unknown collision group '{}', using '{}'", name, DEFAULT_GROUP);
                self.filters.get(DEFAULT_GROUP).copied().unwrap_or(SimulationFilterData::ALL)
            }
        }
    }

    /// Whether shapes of the two named groups generate contacts
    pub fn should_collide(&self, a: &str, b: &str) -> bool {
        self.filter(a).should_collide(&self.filter(b))
    }

    /// Whether a group name is defined
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Group names in bit order
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
