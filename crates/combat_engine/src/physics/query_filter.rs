//! Scene-query filter data
//!
//! Ray casts (most importantly the vehicle's suspension rays) select shapes
//! by the query filter data each collider carries, independently of the
//! simulation filter. The data is packed into the rapier collider's
//! `user_data` so a query predicate can read it without a side table.

use bitflags::bitflags;

bitflags! {
    /// Surface classification read by suspension ray casts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: u32 {
        /// Wheels may rest on this surface
        const DRIVABLE = 1 << 0;
        /// Ray casts for vehicle control ignore this surface
        const UNDRIVABLE = 1 << 1;
    }
}

/// The two named query filter setups a collider can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryFilterType {
    /// Ground the vehicle controller may drive on
    #[default]
    DrivableSurface,
    /// Walls, obstacles and vehicles themselves
    NonDrivableSurface,
}

impl QueryFilterType {
    /// Parse the configuration string. Anything but `DrivableSurface` is non-drivable.
    pub fn from_config_name(name: &str) -> Self {
        if name == "DrivableSurface" {
            Self::DrivableSurface
        } else {
            Self::NonDrivableSurface
        }
    }

    /// Configuration name
    pub fn name(self) -> &'static str {
        match self {
            Self::DrivableSurface => "DrivableSurface",
            Self::NonDrivableSurface => "NonDrivableSurface",
        }
    }

    /// Default filter data for this setup
    pub fn filter_data(self) -> QueryFilterData {
        match self {
            Self::DrivableSurface => QueryFilterData::new(0, SurfaceFlags::DRIVABLE),
            Self::NonDrivableSurface => QueryFilterData::new(0, SurfaceFlags::UNDRIVABLE),
        }
    }
}

/// Query filter data carried by every collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFilterData {
    /// Raycast group bits; a vehicle's own shapes carry its group so its rays skip them
    pub raycast_group: u32,
    /// Surface classification
    pub surface: SurfaceFlags,
}

impl Default for QueryFilterData {
    fn default() -> Self {
        QueryFilterType::default().filter_data()
    }
}

impl QueryFilterData {
    /// Create filter data
    pub fn new(raycast_group: u32, surface: SurfaceFlags) -> Self {
        Self { raycast_group, surface }
    }

    /// Builder pattern: set the raycast group bits
    pub fn with_raycast_group(mut self, raycast_group: u32) -> Self {
        self.raycast_group = raycast_group;
        self
    }

    /// Whether suspension rays may rest on this shape
    pub fn is_drivable(&self) -> bool {
        self.surface.contains(SurfaceFlags::DRIVABLE) && !self.surface.contains(SurfaceFlags::UNDRIVABLE)
    }

    /// Whether a ray cast by the owner of `raycast_group` should see this shape
    pub fn accepts_suspension_ray(&self, raycast_group: u32) -> bool {
        self.is_drivable() && (self.raycast_group & raycast_group) == 0
    }

    /// Pack into collider user data (low 64 bits)
    pub fn to_user_data(self) -> u128 {
        u128::from(self.raycast_group) | (u128::from(self.surface.bits()) << 32)
    }

    /// Unpack from collider user data
    pub fn from_user_data(data: u128) -> Self {
        let raycast_group = (data & 0xFFFF_FFFF) as u32;
        let surface = ((data >> 32) & 0xFFFF_FFFF) as u32;
        Self {
            raycast_group,
            surface: SurfaceFlags::from_bits_truncate(surface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_setups_differ() {
        let drivable = QueryFilterType::from_config_name("DrivableSurface").filter_data();
        let wall = QueryFilterType::from_config_name("Obstacle").filter_data();

        assert!(drivable.is_drivable());
        assert!(!wall.is_drivable());
        assert_ne!(drivable, wall);
    }

    #[test]
    fn test_user_data_packing() {
        let data = QueryFilterType::NonDrivableSurface.filter_data().with_raycast_group(1 << 5);

        assert_eq!(QueryFilterData::from_user_data(data.to_user_data()), data);
    }

    #[test]
    fn test_suspension_rays_skip_own_group() {
        let ground = QueryFilterType::DrivableSurface.filter_data();
        let own_chassis_top = QueryFilterType::DrivableSurface.filter_data().with_raycast_group(1 << 2);

        assert!(ground.accepts_suspension_ray(1 << 2));
        assert!(!own_chassis_top.accepts_suspension_ray(1 << 2));
        assert!(own_chassis_top.accepts_suspension_ray(1 << 3));
    }
}
