//! Windowed host for the viewer
//!
//! [`ViewerApp`] opens a winit window, creates the wgpu [`RenderEngine`], attaches it to
//! a [`Viewer`] and then drives `tick` once per redraw. Pointer input is forwarded to
//! the viewer's interaction methods.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::gfx::rendering::RenderEngine;
use crate::viewer::Viewer;

/// Pixels of touchpad scroll that count as one wheel step
const PIXELS_PER_WHEEL_STEP: f32 = 50.0;

pub struct ViewerApp {
    state: AppState,
}

struct AppState {
    viewer: Viewer<RenderEngine>,
    window: Option<Arc<Window>>,
    title: String,
    timing: FrameTiming,
    cursor: Option<(f32, f32)>,
    dragging: bool,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    pub fn new(viewer: Viewer<RenderEngine>) -> Self {
        Self {
            state: AppState {
                viewer,
                window: None,
                title: "meshview".to_string(),
                timing: FrameTiming::default(),
                cursor: None,
                dragging: false,
                error: None,
            },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.state.title = title.into();
        self
    }

    /// Runs the event loop until the window closes.
    ///
    /// # Errors
    /// Fails if the event loop cannot start or the renderer cannot be created.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.state)
            .context("event loop terminated abnormally")?;

        self.state.viewer.dispose();
        match self.state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.title.clone())
                    .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
            )
            .context("failed to create window")?;
        let window = Arc::new(window);
        let (width, height) = window.inner_size().into();

        let renderer = pollster::block_on(RenderEngine::new(window.clone(), width, height))
            .context("failed to initialize the renderer")?;

        self.viewer.attach(renderer, width, height);
        self.window = Some(window);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.viewer.dispose();
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.create_renderer(event_loop) {
            log::error!("{:#}", err);
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.viewer.resize(width, height);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.dragging = true;
                    self.viewer.begin_interaction();
                }
                ElementState::Released => {
                    if self.dragging {
                        self.dragging = false;
                        self.viewer.end_interaction();
                    }
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let current = (position.x as f32, position.y as f32);
                if let (true, Some((x, y))) = (self.dragging, self.cursor) {
                    self.viewer.rotate_camera(current.0 - x, current.1 - y);
                }
                self.cursor = Some(current);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_WHEEL_STEP,
                };
                // scrolling up moves the camera in
                self.viewer.zoom_camera(-steps);
            }
            WindowEvent::RedrawRequested => {
                let elapsed = self.timing.tick(Instant::now());
                self.viewer.tick(elapsed);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

/// Seconds between consecutive redraws
#[derive(Debug, Default)]
struct FrameTiming {
    last_frame_time: Option<Instant>,
}

impl FrameTiming {
    /// Longest step fed to the viewer, so a stalled window does not spin the model
    const MAX_STEP: Duration = Duration::from_millis(250);

    fn tick(&mut self, now: Instant) -> f32 {
        let dt = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last).min(Self::MAX_STEP),
            None => Duration::ZERO,
        };
        self.last_frame_time = Some(now);
        dt.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing_clamps_long_stalls() {
        let mut timing = FrameTiming::default();
        let start = Instant::now();
        assert_eq!(timing.tick(start), 0.0);

        let dt = timing.tick(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);

        let dt = timing.tick(start + Duration::from_secs(10));
        assert!((dt - 0.25).abs() < 1e-6);
    }
}
