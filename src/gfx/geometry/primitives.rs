//! # Primitive Shape Generation
//!
//! Small procedural meshes, mainly used as stand-in models.

use super::Geometry;

/// Indexed cube with edge length `size`, centered at the origin.
///
/// Each face has its own four vertices so face normals stay sharp.
pub fn cube(size: f32) -> Geometry {
    let h = size * 0.5;

    #[rustfmt::skip]
    let positions = vec![
        // Front face
        [-h, -h,  h], [ h, -h,  h], [ h,  h,  h], [-h,  h,  h],
        // Back face
        [-h, -h, -h], [-h,  h, -h], [ h,  h, -h], [ h, -h, -h],
        // Left face
        [-h, -h, -h], [-h, -h,  h], [-h,  h,  h], [-h,  h, -h],
        // Right face
        [ h, -h,  h], [ h, -h, -h], [ h,  h, -h], [ h,  h,  h],
        // Top face
        [-h,  h,  h], [ h,  h,  h], [ h,  h, -h], [-h,  h, -h],
        // Bottom face
        [-h, -h, -h], [ h, -h, -h], [ h, -h,  h], [-h, -h,  h],
    ];

    let indices = (0..6u32)
        .flat_map(|face| {
            let i = face * 4;
            [i, i + 1, i + 2, i + 2, i + 3, i]
        })
        .collect();

    let mut geometry = Geometry::new(positions, Some(indices));
    geometry.compute_vertex_normals();
    geometry
}

/// Non-indexed horizontal quad in the XZ plane at y = 0, facing +Y.
pub fn quad(width: f32, depth: f32) -> Geometry {
    let (w, d) = (width * 0.5, depth * 0.5);
    let positions = vec![
        [-w, 0.0, -d],
        [-w, 0.0, d],
        [w, 0.0, d],
        [-w, 0.0, -d],
        [w, 0.0, d],
        [w, 0.0, -d],
    ];
    let mut geometry = Geometry::new(positions, None);
    geometry.compute_vertex_normals();
    geometry
}
