//! # Scene Primitives
//!
//! Building blocks of the viewer scene: the node tree that holds a loaded model,
//! materials, lights, the grid helper, the environment texture and vertex formats.
//!
//! Loaded models are owned [`Node`] trees. Drawable nodes carry [`Geometry`] and a
//! [`MaterialSlot`]; wireframe overlays are separate child nodes so they can be
//! toggled without touching the mesh.
//!
//! [`Geometry`]: crate::gfx::geometry::Geometry

pub mod grid;
pub mod lights;
pub mod material;
pub mod node;
pub mod texture;
pub mod vertex;

// Re-export main types
pub use grid::GridHelper;
pub use lights::{AmbientLight, DirectionalLight, ShadowSettings};
pub use material::{LineMaterial, Material, MaterialSlot};
pub use node::{Drawable, Node, NodeKind, Transform, WireframeOverlay};
pub use texture::{EnvironmentTexture, TextureMapping};
pub use vertex::{LineVertex, Vertex3D};
