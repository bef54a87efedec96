//! Active model ownership
//!
//! A freshly loaded tree goes through [`ModelManager::prepare`] (normalize, shadows,
//! wireframe overlays, triangle count) and then [`ModelManager::install`], which swaps
//! it in and disposes the previous model in the same call. At most one model is ever
//! active.

use cgmath::{Matrix4, Vector3};

use crate::config::Color;
use crate::error::DisposalError;
use crate::gfx::resources::{ResourceKind, ResourceRegistry};
use crate::gfx::scene::{LineMaterial, Node, NodeKind, WireframeOverlay};

use super::triangles::count_triangles;

/// Bounding-box diagonal of a normalized model
pub const TARGET_SIZE: f32 = 5.0;

/// A model ready to be installed
#[derive(Debug)]
pub struct PreparedModel {
    pub root: Node,
    pub triangles: u64,
}

#[derive(Debug)]
pub struct ModelManager {
    active: Option<Node>,
    wireframe_color: Color,
}

impl ModelManager {
    pub fn new(wireframe_color: Color) -> Self {
        Self {
            active: None,
            wireframe_color,
        }
    }

    pub fn active(&self) -> Option<&Node> {
        self.active.as_ref()
    }

    /// Normalizes `root`, enables shadows, attaches overlays and counts triangles.
    pub fn prepare(&self, mut root: Node, wireframe_visible: bool) -> PreparedModel {
        normalize(&mut root);
        attach_overlays(&mut root, self.wireframe_color, wireframe_visible);
        let triangles = count_triangles(&mut root);
        PreparedModel { root, triangles }
    }

    /// Makes `model` the active model and disposes the one it replaces.
    pub fn install(
        &mut self,
        model: PreparedModel,
        registry: &mut ResourceRegistry,
    ) -> Result<(), DisposalError> {
        let mut root = model.root;
        upload(&mut root, registry);
        match self.active.replace(root) {
            Some(mut previous) => dispose_model(&mut previous, registry),
            None => Ok(()),
        }
    }

    /// Shows or hides every overlay of the active model.
    pub fn set_wireframe_visible(&mut self, visible: bool) {
        let Some(root) = self.active.as_mut() else {
            return;
        };
        root.traverse_mut(&mut |node| {
            if matches!(node.kind, NodeKind::Wireframe(_)) {
                node.visible = visible;
            }
        });
    }

    /// Disposes and drops the active model, if any.
    pub fn dispose_active(&mut self, registry: &mut ResourceRegistry) -> Result<(), DisposalError> {
        match self.active.take() {
            Some(mut root) => dispose_model(&mut root, registry),
            None => Ok(()),
        }
    }
}

/// Uniformly scales `root` to a [`TARGET_SIZE`] diagonal, centers it on X and Z and
/// rests its lowest point on y = 0.
///
/// Replaces the root's scale and position; its rotation is kept. Degenerate boxes are
/// not scaled, and an empty box leaves the transform alone.
pub fn normalize(root: &mut Node) {
    let local = root.content_bounds();
    if local.is_empty() {
        log::warn!("Model '{}' has no geometry bounds; skipping normalization", root.name);
        return;
    }
    let bounds = local.transform(&Matrix4::from(root.transform.rotation));

    let diagonal = bounds.diagonal();
    let scale = if diagonal.is_finite() && diagonal > 0.0 {
        TARGET_SIZE / diagonal
    } else {
        log::warn!(
            "Model '{}' has a degenerate bounding box (diagonal {}); keeping its scale",
            root.name,
            diagonal
        );
        1.0
    };

    let center = bounds.center();
    root.transform.scale = Vector3::new(scale, scale, scale);
    root.transform.position = Vector3::new(
        -center.x * scale,
        -bounds.min.y * scale,
        -center.z * scale,
    );
}

/// Turns on shadows and gives each drawable one hidden-or-shown edge overlay child.
fn attach_overlays(root: &mut Node, color: Color, visible: bool) {
    root.traverse_mut(&mut |node| {
        let NodeKind::Mesh(drawable) = &mut node.kind else {
            return;
        };
        drawable.cast_shadow = true;
        drawable.receive_shadow = true;

        let has_overlay = node
            .children
            .iter()
            .any(|c| matches!(c.kind, NodeKind::Wireframe(_)));
        if has_overlay {
            return;
        }
        let overlay = WireframeOverlay {
            geometry: drawable.geometry.wireframe(),
            material: LineMaterial::new(color),
        };
        let mut child = Node::wireframe(format!("{}_wireframe", node.name), overlay);
        child.visible = visible;
        node.children.push(child);
    });
}

/// Registers every geometry and material of the tree with the registry.
fn upload(root: &mut Node, registry: &mut ResourceRegistry) {
    root.traverse_mut(&mut |node| match &mut node.kind {
        NodeKind::Group => {}
        NodeKind::Mesh(drawable) => {
            drawable.geometry.gpu.acquire(registry, ResourceKind::Geometry);
            for material in drawable.material.iter_mut() {
                material.gpu.acquire(registry, ResourceKind::Material);
            }
        }
        NodeKind::Wireframe(overlay) => {
            overlay.geometry.gpu.acquire(registry, ResourceKind::Geometry);
            overlay.material.gpu.acquire(registry, ResourceKind::Material);
        }
    });
}

/// Releases every resource of `root` and detaches its overlays.
///
/// Idempotent: released handles are cleared, so a second call releases nothing. All
/// resources are visited even if one release fails; the first failure is returned.
pub fn dispose_model(root: &mut Node, registry: &mut ResourceRegistry) -> Result<(), DisposalError> {
    let mut first_error = None;
    let mut record = |result: Result<bool, DisposalError>| {
        if let Err(err) = result {
            first_error.get_or_insert(err);
        }
    };

    root.traverse_mut(&mut |node| {
        match &mut node.kind {
            NodeKind::Group => {}
            NodeKind::Mesh(drawable) => {
                record(drawable.geometry.gpu.release(registry));
                for material in drawable.material.iter_mut() {
                    record(material.gpu.release(registry));
                }
            }
            NodeKind::Wireframe(overlay) => {
                record(overlay.geometry.gpu.release(registry));
                record(overlay.material.gpu.release(registry));
            }
        }
    });
    // Overlays are detached only after the full walk so their handles get released.
    root.traverse_mut(&mut |node| {
        node.children
            .retain(|child| !matches!(child.kind, NodeKind::Wireframe(_)));
    });

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
