//! Collider geometry descriptors
//!
//! A [`ColliderGeometry`] is owned by its collider and stored in the
//! collider's local space; it becomes a rapier shape only when the collider
//! is attached to an actor.

use rapier3d::prelude::ColliderBuilder;

use super::PhysicsError;
use crate::config::ConfigDocument;
use crate::foundation::math::{Point3, Vec3};

/// Shape family of a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderType {
    /// Oriented box
    Box,
    /// Sphere
    Sphere,
    /// Y-aligned cylinder
    Cylinder,
    /// Convex hull of a point cloud
    ConvexMesh,
    /// Arbitrary triangle mesh (static geometry)
    TriangleMesh,
}

impl ColliderType {
    /// Display name used by the inspector and content files
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Box => "Box",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
            Self::ConvexMesh => "ConvexMesh",
            Self::TriangleMesh => "TriangleMesh",
        }
    }

    /// Parse a content-file name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Box" => Some(Self::Box),
            "Sphere" => Some(Self::Sphere),
            "Cylinder" => Some(Self::Cylinder),
            "ConvexMesh" => Some(Self::ConvexMesh),
            "TriangleMesh" => Some(Self::TriangleMesh),
            _ => None,
        }
    }
}

/// Geometry descriptor in collider-local space
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderGeometry {
    /// Box with the given half extents
    Box {
        /// Half size along each axis
        half_extents: Vec3,
    },
    /// Sphere
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Cylinder along local Y
    Cylinder {
        /// Half of the height
        half_height: f32,
        /// Radius
        radius: f32,
    },
    /// Convex hull of points
    ConvexMesh {
        /// Hull input points
        points: Vec<Point3>,
    },
    /// Triangle mesh
    TriangleMesh {
        /// Vertex positions
        vertices: Vec<Point3>,
        /// Triangle vertex indices
        indices: Vec<[u32; 3]>,
    },
}

impl ColliderGeometry {
    /// Box from full size
    pub fn cuboid(size: Vec3) -> Self {
        Self::Box { half_extents: size * 0.5 }
    }

    /// Shape family
    pub fn collider_type(&self) -> ColliderType {
        match self {
            Self::Box { .. } => ColliderType::Box,
            Self::Sphere { .. } => ColliderType::Sphere,
            Self::Cylinder { .. } => ColliderType::Cylinder,
            Self::ConvexMesh { .. } => ColliderType::ConvexMesh,
            Self::TriangleMesh { .. } => ColliderType::TriangleMesh,
        }
    }

    /// Read geometry from a collider document.
    ///
    /// Keys: `Type`, `Size` (box), `Radius`, `HalfHeight`, `Vertices`
    /// (list of 3-component lists), `Indices` (list of 3-component lists).
    /// Unknown types fall back to a unit box.
    pub fn from_config(doc: &ConfigDocument) -> Self {
        let type_name = doc.str_or("Type", "Box");
        let collider_type = ColliderType::from_name(&type_name).unwrap_or_else(|| {
            log::debug!("Unknown collider type '{}', using Box", type_name);
            ColliderType::Box
        });

        let points = || -> Vec<Point3> {
            doc.get_or::<Vec<[f32; 3]>>("Vertices", Vec::new())
                .into_iter()
                .map(Point3::from)
                .collect()
        };

        match collider_type {
            ColliderType::Box => Self::cuboid(doc.vec3_or("Size", Vec3::new(1.0, 1.0, 1.0))),
            ColliderType::Sphere => Self::Sphere { radius: doc.get_or("Radius", 0.5) },
            ColliderType::Cylinder => Self::Cylinder {
                half_height: doc.get_or("HalfHeight", 0.5),
                radius: doc.get_or("Radius", 0.5),
            },
            ColliderType::ConvexMesh => Self::ConvexMesh { points: points() },
            ColliderType::TriangleMesh => Self::TriangleMesh {
                vertices: points(),
                indices: doc.get_or("Indices", Vec::new()),
            },
        }
    }

    /// Geometry with a transform scale baked in. Round shapes take the largest component.
    pub fn scaled(&self, scale: Vec3) -> Self {
        let uniform = scale.x.abs().max(scale.y.abs()).max(scale.z.abs());
        let scale_point = |p: &Point3| Point3::from(p.coords.component_mul(&scale));
        match self {
            Self::Box { half_extents } => Self::Box { half_extents: half_extents.component_mul(&scale.abs()) },
            Self::Sphere { radius } => Self::Sphere { radius: radius * uniform },
            Self::Cylinder { half_height, radius } => Self::Cylinder {
                half_height: half_height * scale.y.abs(),
                radius: radius * scale.x.abs().max(scale.z.abs()),
            },
            Self::ConvexMesh { points } => Self::ConvexMesh { points: points.iter().map(scale_point).collect() },
            Self::TriangleMesh { vertices, indices } => Self::TriangleMesh {
                vertices: vertices.iter().map(scale_point).collect(),
                indices: indices.clone(),
            },
        }
    }

    /// Create the rapier builder for this geometry
    pub fn to_builder(&self) -> Result<ColliderBuilder, PhysicsError> {
        match self {
            Self::Box { half_extents } => {
                if half_extents.iter().any(|e| !(*e > 0.0)) {
                    return Err(PhysicsError::InvalidGeometry(format!("box half extents {:?}", half_extents)));
                }
                Ok(ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z))
            }
            Self::Sphere { radius } if *radius > 0.0 => Ok(ColliderBuilder::ball(*radius)),
            Self::Cylinder { half_height, radius } if *half_height > 0.0 && *radius > 0.0 => {
                Ok(ColliderBuilder::cylinder(*half_height, *radius))
            }
            Self::ConvexMesh { points } => (points.len() >= 4)
                .then(|| ColliderBuilder::convex_hull(points))
                .flatten()
                .ok_or_else(|| PhysicsError::InvalidGeometry(format!("convex hull of {} points", points.len()))),
            Self::TriangleMesh { vertices, indices } => {
                let in_range = indices.iter().flatten().all(|&i| (i as usize) < vertices.len());
                if indices.is_empty() || !in_range {
                    return Err(PhysicsError::InvalidGeometry(format!(
                        "triangle mesh with {} vertices and {} triangles",
                        vertices.len(),
                        indices.len()
                    )));
                }
                Ok(ColliderBuilder::trimesh(vertices.clone(), indices.clone()))
            }
            Self::Sphere { .. } | Self::Cylinder { .. } => {
                Err(PhysicsError::InvalidGeometry(format!("{:?}", self)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_type_names() {
        assert_eq!(ColliderGeometry::cuboid(Vec3::new(1.0, 1.0, 1.0)).collider_type().type_name(), "Box");
        assert_eq!(ColliderType::from_name("ConvexMesh"), Some(ColliderType::ConvexMesh));
        assert_eq!(ColliderType::from_name("Capsule"), None);
    }

    #[test]
    fn test_from_config_reads_box_size() {
        let doc = ConfigDocument::new()
            .with("Type", "Box")
            .with_vec3("Size", Vec3::new(2.0, 1.0, 4.0));

        let geometry = ColliderGeometry::from_config(&doc);

        assert_eq!(geometry, ColliderGeometry::Box { half_extents: Vec3::new(1.0, 0.5, 2.0) });
    }

    #[test]
    fn test_scaled_sphere_uses_largest_component() {
        let sphere = ColliderGeometry::Sphere { radius: 1.0 }.scaled(Vec3::new(1.0, 3.0, 2.0));

        match sphere {
            ColliderGeometry::Sphere { radius } => assert_relative_eq!(radius, 3.0),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_geometry_is_rejected() {
        assert!(ColliderGeometry::Sphere { radius: 0.0 }.to_builder().is_err());
        assert!(ColliderGeometry::TriangleMesh { vertices: vec![Point3::origin()], indices: vec![[0, 1, 2]] }
            .to_builder()
            .is_err());
        assert!(ColliderGeometry::ConvexMesh { points: Vec::new() }.to_builder().is_err());
        assert!(ColliderGeometry::cuboid(Vec3::new(1.0, 1.0, 1.0)).to_builder().is_ok());
    }
}
