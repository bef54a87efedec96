//! Scene node tree
//!
//! A model is an owned tree of [`Node`]s. Each node carries a local [`Transform`] and a
//! tagged [`NodeKind`]; traversal dispatches on the tag.

use cgmath::{Matrix4, One, Quaternion, Vector3};

use crate::gfx::geometry::{Aabb, Geometry, LineGeometry};

use super::material::{LineMaterial, MaterialSlot};

/// Translation, rotation and scale applied in T * R * S order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Renderable triangle mesh
#[derive(Debug, Clone)]
pub struct Drawable {
    pub geometry: Geometry,
    pub material: MaterialSlot,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Drawable {
    pub fn new(geometry: Geometry, material: MaterialSlot) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Edge overlay generated for a drawable
#[derive(Debug, Clone)]
pub struct WireframeOverlay {
    pub geometry: LineGeometry,
    pub material: LineMaterial,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(Drawable),
    Wireframe(WireframeOverlay),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    /// An invisible node hides its whole subtree
    pub visible: bool,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            visible: true,
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, drawable: Drawable) -> Self {
        Self::with_kind(name, NodeKind::Mesh(drawable))
    }

    pub fn wireframe(name: impl Into<String>, overlay: WireframeOverlay) -> Self {
        Self::with_kind(name, NodeKind::Wireframe(overlay))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn drawable(&self) -> Option<&Drawable> {
        match &self.kind {
            NodeKind::Mesh(d) => Some(d),
            _ => None,
        }
    }

    /// Pre-order walk over this node and all descendants.
    pub fn traverse<F: FnMut(&Node)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn traverse_mut<F: FnMut(&mut Node)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Walks visible nodes with their world matrices, skipping hidden subtrees.
    pub fn visit_visible<'s, F>(&'s self, parent: Matrix4<f32>, f: &mut F)
    where
        F: FnMut(&'s Node, Matrix4<f32>),
    {
        if !self.visible {
            return;
        }
        let world = parent * self.transform.matrix();
        f(self, world);
        for child in &self.children {
            child.visit_visible(world, f);
        }
    }

    /// Number of nodes in the subtree matching `pred`.
    pub fn count<P: Fn(&Node) -> bool>(&self, pred: P) -> usize {
        let mut n = 0;
        self.traverse(&mut |node| {
            if pred(node) {
                n += 1;
            }
        });
        n
    }

    /// Bounds of all drawable geometry below this node, in this node's local space.
    ///
    /// The node's own transform is not applied.
    pub fn content_bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        self.collect_bounds(Matrix4::one(), &mut bounds);
        bounds
    }

    fn collect_bounds(&self, matrix: Matrix4<f32>, out: &mut Aabb) {
        if let NodeKind::Mesh(drawable) = &self.kind {
            out.union(&drawable.geometry.bounding_box().transform(&matrix));
        }
        for child in &self.children {
            child.collect_bounds(matrix * child.transform.matrix(), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::cube;
    use crate::gfx::scene::material::Material;

    fn cube_node(name: &str, size: f32) -> Node {
        Node::mesh(name, Drawable::new(cube(size), MaterialSlot::Single(Material::default())))
    }

    #[test]
    fn test_transform_matrix_order() {
        let transform = Transform {
            position: Vector3::new(1.0, 0.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
            ..Default::default()
        };
        let p = transform.matrix() * cgmath::Vector4::new(1.0, 0.0, 0.0, 1.0);
        // scaled first, then translated
        assert_eq!(p.x, 3.0);
    }

    #[test]
    fn test_content_bounds_include_child_transforms() {
        let child = cube_node("child", 2.0).with_transform(Transform {
            position: Vector3::new(0.0, 5.0, 0.0),
            ..Default::default()
        });
        let root = Node::group("root")
            .with_transform(Transform {
                scale: Vector3::new(10.0, 10.0, 10.0),
                ..Default::default()
            })
            .with_child(cube_node("base", 2.0))
            .with_child(child);

        let bounds = root.content_bounds();
        assert_eq!(bounds.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vector3::new(1.0, 6.0, 1.0));
    }

    #[test]
    fn test_hidden_subtree_is_skipped() {
        let mut hidden = Node::group("hidden").with_child(cube_node("a", 1.0));
        hidden.visible = false;
        let root = Node::group("root").with_child(hidden).with_child(cube_node("b", 1.0));

        let mut names = Vec::new();
        root.visit_visible(Matrix4::one(), &mut |node, _| names.push(node.name.clone()));
        assert_eq!(names, vec!["root", "b"]);
        assert_eq!(root.count(|n| n.drawable().is_some()), 2);
    }
}
