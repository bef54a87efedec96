//! # Mesh Geometry
//!
//! CPU-side triangle and line geometry as produced by the loaders. The renderer uploads
//! it once the owning model is installed and a registry handle has been acquired.
//!
//! Geometry is either *indexed* (triangles reference shared vertices through
//! `indices`) or *non-indexed* (every three consecutive vertices form a triangle).

pub mod bounds;
pub mod primitives;

use std::collections::HashSet;

use cgmath::{InnerSpace, Vector3};

use crate::gfx::resources::GpuHandle;
use crate::gfx::scene::vertex::{LineVertex, Vertex3D};

pub use bounds::Aabb;
pub use primitives::*;

/// Triangle mesh data
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals; may be empty until [`compute_vertex_normals`](Self::compute_vertex_normals) runs
    pub normals: Vec<[f32; 3]>,
    pub indices: Option<Vec<u32>>,
    pub gpu: GpuHandle,
}

impl Geometry {
    pub fn new(positions: Vec<[f32; 3]>, indices: Option<Vec<u32>>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            indices,
            gpu: GpuHandle::default(),
        }
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = normals;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> Option<usize> {
        self.indices.as_ref().map(Vec::len)
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of whole triangles, `index_count / 3` or `vertex_count / 3`.
    pub fn triangle_count(&self) -> usize {
        self.index_count().unwrap_or_else(|| self.vertex_count()) / 3
    }

    /// Recomputes per-vertex normals from the triangles.
    ///
    /// Indexed geometry accumulates unnormalized face normals into shared vertices,
    /// which weights each face by its area. Non-indexed geometry gets flat normals.
    /// Out-of-range indices are skipped.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3::new(0.0_f32, 0.0, 0.0); self.positions.len()];

        match &self.indices {
            Some(indices) => {
                for tri in indices.chunks_exact(3) {
                    let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
                    let (Some(pa), Some(pb), Some(pc)) = (
                        self.positions.get(a),
                        self.positions.get(b),
                        self.positions.get(c),
                    ) else {
                        continue;
                    };
                    let face = face_normal(*pa, *pb, *pc);
                    normals[a] += face;
                    normals[b] += face;
                    normals[c] += face;
                }
            }
            None => {
                for (i, tri) in self.positions.chunks_exact(3).enumerate() {
                    let face = face_normal(tri[0], tri[1], tri[2]);
                    for n in &mut normals[i * 3..i * 3 + 3] {
                        *n = face;
                    }
                }
            }
        }

        self.normals = normals
            .into_iter()
            .map(|n| {
                let len = n.magnitude();
                if len > 0.0 { (n / len).into() } else { [0.0; 3] }
            })
            .collect();
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(&self.positions)
    }

    /// Line geometry with one segment per unique triangle edge.
    ///
    /// Indexed edges are deduplicated by vertex index pair; non-indexed edges by the
    /// exact endpoint positions.
    pub fn wireframe(&self) -> LineGeometry {
        let mut positions = Vec::new();

        match &self.indices {
            Some(indices) => {
                let mut seen = HashSet::new();
                for tri in indices.chunks_exact(3) {
                    for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                        let key = (a.min(b), a.max(b));
                        if !seen.insert(key) {
                            continue;
                        }
                        if let (Some(pa), Some(pb)) = (
                            self.positions.get(a as usize),
                            self.positions.get(b as usize),
                        ) {
                            positions.push(*pa);
                            positions.push(*pb);
                        }
                    }
                }
            }
            None => {
                let mut seen = HashSet::new();
                for tri in self.positions.chunks_exact(3) {
                    for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                        let (ka, kb) = (position_key(a), position_key(b));
                        let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
                        if seen.insert(key) {
                            positions.push(a);
                            positions.push(b);
                        }
                    }
                }
            }
        }

        LineGeometry::new(positions)
    }

    /// Interleaved vertices for upload; missing normals default to +Y.
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}

/// Line-list geometry: every two consecutive positions form a segment.
#[derive(Debug, Clone, Default)]
pub struct LineGeometry {
    pub positions: Vec<[f32; 3]>,
    pub gpu: GpuHandle,
}

impl LineGeometry {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            gpu: GpuHandle::default(),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.positions.len() / 2
    }

    pub fn to_vertices(&self) -> Vec<LineVertex> {
        self.positions
            .iter()
            .map(|p| LineVertex { position: *p })
            .collect()
    }
}

fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Vector3<f32> {
    let a = Vector3::from(a);
    let cb = Vector3::from(c) - Vector3::from(b);
    let ab = a - Vector3::from(b);
    cb.cross(ab)
}

fn position_key(p: [f32; 3]) -> [u32; 3] {
    [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()]
}
