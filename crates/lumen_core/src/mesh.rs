//! Triangle mesh value type handed to the renderer by geometry loaders.
//!
//! A mesh is plain data: positions, a flat triangle index array and optional
//! per-vertex normals and UVs. Loaders fill it in; [`Mesh::validate`] is the
//! single place where malformed input is rejected.

use lumen_math::{Bounds3, Mat3, Mat4, Vec3};
use thiserror::Error;

/// Errors describing malformed mesh data.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("Triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Attribute '{attribute}' has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Failed to read mesh: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported PLY content: {0}")]
    Ply(String),

    #[error("No meshes found in {0}")]
    Empty(String),
}

pub type MeshResult<T> = Result<T, MeshError>;

/// A mesh consisting of vertex positions, triangle indices and optional attributes.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one [u, v] per vertex)
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// World-space bounds of all positions
    pub bounds: Bounds3,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        Self::new_with_uvs(positions, indices, normals, None)
    }

    /// Create a new mesh with UV coordinates.
    pub fn new_with_uvs(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<[f32; 2]>>,
    ) -> Self {
        let bounds = positions
            .iter()
            .fold(Bounds3::EMPTY, |b, p| b.union_point(*p));
        Self {
            positions,
            normals,
            uvs,
            indices,
            bounds,
        }
    }

    /// Check that the index array forms whole triangles over existing vertices
    /// and that every per-vertex attribute matches the vertex count.
    pub fn validate(&self) -> MeshResult<()> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(self.indices.len()));
        }

        let vertex_count = self.positions.len();
        for (i, &index) in self.indices.iter().enumerate() {
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    triangle: i / 3,
                    index,
                    vertex_count,
                });
            }
        }

        if let Some(normals) = &self.normals {
            check_attribute("normals", normals.len(), vertex_count)?;
        }
        if let Some(uvs) = &self.uvs {
            check_attribute("uvs", uvs.len(), vertex_count)?;
        }

        Ok(())
    }

    /// Compute smooth vertex normals by averaging counter-clockwise face normals.
    ///
    /// Faces with out-of-range indices are skipped; call [`Mesh::validate`] first
    /// if that matters.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Z);
        }

        log::debug!("Computed {} smooth normals", vertex_count);
        self.normals = Some(normals);
    }

    /// Copy of the mesh with `object_to_world` applied.
    ///
    /// Normals go through the inverse transpose so they stay perpendicular
    /// under non-uniform scale. A mirroring transform also flips triangle
    /// winding, so the geometric normal turns with it.
    pub fn transformed(&self, object_to_world: &Mat4) -> Mesh {
        let positions = self
            .positions
            .iter()
            .map(|&p| object_to_world.transform_point3(p))
            .collect();

        let normal_matrix = Mat3::from_mat4(*object_to_world).inverse().transpose();
        let normals = self.normals.as_ref().map(|normals| {
            normals
                .iter()
                .map(|&n| (normal_matrix * n).normalize_or_zero())
                .collect()
        });

        Mesh::new_with_uvs(positions, self.indices.clone(), normals, self.uvs.clone())
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Vertex indices of triangle `i`.
    pub fn triangle(&self, i: usize) -> [usize; 3] {
        let base = 3 * i;
        [
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        ]
    }
}

fn check_attribute(attribute: &'static str, actual: usize, expected: usize) -> MeshResult<()> {
    if actual != expected {
        return Err(MeshError::AttributeLength {
            attribute,
            expected,
            actual,
        });
    }
    Ok(())
}
