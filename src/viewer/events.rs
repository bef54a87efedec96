use crate::loaders::AssetKind;

/// Notifications delivered to registered listeners
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// Emitted after every finished load request, stale ones included
    LoadProgress { percent: u32 },
    ModelLoaded { path: String, triangles: u64 },
    /// Camera position and orbit target, rounded to two decimals
    CameraUpdated {
        camera_position: [f32; 3],
        target_position: [f32; 3],
    },
    LoadFailed {
        kind: AssetKind,
        path: String,
        cause: String,
    },
}

pub type Listener = Box<dyn FnMut(&ViewerEvent)>;
