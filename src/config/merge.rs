//! Shallow per-sub-record merge of a partial override onto defaults

use super::{
    CameraConfig, ControlsConfig, GridConfig, LightingConfig, PartialCameraConfig,
    PartialControlsConfig, PartialGridConfig, PartialLightingConfig, PartialRenderingConfig,
    PartialViewerConfig, PartialWireframeConfig, RenderingConfig, ViewerConfig, WireframeConfig,
};

/// Combines `defaults` with `overrides`.
///
/// Within each of the six sub-records a field present in `overrides` wins and an
/// absent field keeps its default. A sub-record override never resets the fields
/// it leaves out. The merge is total: values are not range checked.
pub fn merge_with_defaults(defaults: &ViewerConfig, overrides: &PartialViewerConfig) -> ViewerConfig {
    ViewerConfig {
        camera: merge_camera(&defaults.camera, overrides.camera.as_ref()),
        controls: merge_controls(&defaults.controls, overrides.controls.as_ref()),
        rendering: merge_rendering(&defaults.rendering, overrides.rendering.as_ref()),
        lighting: merge_lighting(&defaults.lighting, overrides.lighting.as_ref()),
        grid: merge_grid(&defaults.grid, overrides.grid.as_ref()),
        wireframe: merge_wireframe(&defaults.wireframe, overrides.wireframe.as_ref()),
        auto_rotate: overrides.auto_rotate.unwrap_or(defaults.auto_rotate),
        auto_rotate_speed: overrides
            .auto_rotate_speed
            .unwrap_or(defaults.auto_rotate_speed),
    }
}

fn merge_camera(d: &CameraConfig, o: Option<&PartialCameraConfig>) -> CameraConfig {
    let Some(o) = o else {
        return d.clone();
    };
    CameraConfig {
        camera_position: o.camera_position.unwrap_or(d.camera_position),
        fov: o.fov.unwrap_or(d.fov),
    }
}

fn merge_controls(d: &ControlsConfig, o: Option<&PartialControlsConfig>) -> ControlsConfig {
    let Some(o) = o else {
        return d.clone();
    };
    ControlsConfig {
        target_position: o.target_position.unwrap_or(d.target_position),
        enable_controls: o.enable_controls.unwrap_or(d.enable_controls),
        enable_zoom: o.enable_zoom.unwrap_or(d.enable_zoom),
    }
}

fn merge_rendering(d: &RenderingConfig, o: Option<&PartialRenderingConfig>) -> RenderingConfig {
    let Some(o) = o else {
        return d.clone();
    };
    RenderingConfig {
        background_color: o.background_color.or(d.background_color),
        environment_path: o
            .environment_path
            .clone()
            .or_else(|| d.environment_path.clone()),
        ambient_color: o.ambient_color.unwrap_or(d.ambient_color),
        ambient_intensity: o.ambient_intensity.unwrap_or(d.ambient_intensity),
    }
}

fn merge_lighting(d: &LightingConfig, o: Option<&PartialLightingConfig>) -> LightingConfig {
    let Some(o) = o else {
        return d.clone();
    };
    LightingConfig {
        position: o.position.unwrap_or(d.position),
        color: o.color.unwrap_or(d.color),
        intensity: o.intensity.unwrap_or(d.intensity),
        cast_shadow: o.cast_shadow.unwrap_or(d.cast_shadow),
    }
}

fn merge_grid(d: &GridConfig, o: Option<&PartialGridConfig>) -> GridConfig {
    let Some(o) = o else {
        return d.clone();
    };
    GridConfig {
        size: o.size.unwrap_or(d.size),
        divisions: o.divisions.unwrap_or(d.divisions),
        color: o.color.unwrap_or(d.color),
        enable_grid: o.enable_grid.unwrap_or(d.enable_grid),
    }
}

fn merge_wireframe(d: &WireframeConfig, o: Option<&PartialWireframeConfig>) -> WireframeConfig {
    let Some(o) = o else {
        return d.clone();
    };
    WireframeConfig {
        color: o.color.unwrap_or(d.color),
        enable_wireframe: o.enable_wireframe.unwrap_or(d.enable_wireframe),
    }
}
