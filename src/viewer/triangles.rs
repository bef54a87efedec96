use crate::gfx::scene::{Node, NodeKind};

/// Sums the triangles of every drawable below `root`.
///
/// Vertex normals are recomputed on the way. Indexed geometry contributes
/// `index_count / 3`, non-indexed geometry `vertex_count / 3`, both rounded down.
pub fn count_triangles(root: &mut Node) -> u64 {
    let mut total = 0u64;
    root.traverse_mut(&mut |node| {
        if let NodeKind::Mesh(drawable) = &mut node.kind {
            drawable.geometry.compute_vertex_normals();
            total += drawable.geometry.triangle_count() as u64;
        }
    });
    total
}
