//! vesselwave - an ocean scene that showcases a fleet one vessel at a time.
//!
//! The camera eases from vessel to vessel every few seconds while the water
//! and the boats keep moving underneath.

mod cli;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use cli::Args;
use vesselwave::params::RenderConfig;
use vesselwave::rendering::RenderSystem;
use vesselwave::scene::SceneComposer;
use vesselwave::vessel::AssetProvider;

/// Scroll progress gained per wheel line
const SCROLL_PER_LINE: f32 = 0.05;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    render_config: RenderConfig,

    // Scene and model loading
    scene: SceneComposer,
    assets: Box<dyn AssetProvider>,

    // Input
    mouse_pressed: bool,
    last_cursor: Option<(f64, f64)>,

    // Time tracking
    start_time: Instant,
    last_frame: Instant,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let scene_file = args.load_scene()?;
        let environment = args.load_environment();
        let mut scene =
            SceneComposer::new(scene_file, environment).context("Invalid scene configuration")?;
        if args.free_camera {
            scene.camera_mut().set_tracking(false);
        }

        let now = Instant::now();
        Ok(Self {
            window: None,
            render_system: None,
            render_config: RenderConfig::default(),
            scene,
            assets: args.asset_provider(),
            mouse_pressed: false,
            last_cursor: None,
            start_time: now,
            last_frame: now,
        })
    }

    /// Stop the scene and free GPU resources, then leave the event loop
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.scene.teardown();
        if let Some(render_system) = &mut self.render_system {
            render_system.release();
        }
        event_loop.exit();
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        let digit = match code {
            KeyCode::Digit1 => Some(0),
            KeyCode::Digit2 => Some(1),
            KeyCode::Digit3 => Some(2),
            KeyCode::Digit4 => Some(3),
            KeyCode::Digit5 => Some(4),
            KeyCode::Digit6 => Some(5),
            KeyCode::Digit7 => Some(6),
            KeyCode::Digit8 => Some(7),
            KeyCode::Digit9 => Some(8),
            _ => None,
        };
        if let Some(index) = digit {
            if let Err(e) = self.scene.select(index) {
                log::warn!("{e}");
            }
            return;
        }

        match code {
            KeyCode::Escape => self.shutdown(event_loop),
            KeyCode::ArrowRight => {
                self.scene.next();
            }
            KeyCode::ArrowLeft => {
                self.scene.previous();
            }
            KeyCode::KeyF => {
                let camera = self.scene.camera_mut();
                let tracking = camera.is_tracking();
                camera.set_tracking(!tracking);
            }
            _ => {}
        }
    }

    fn handle_scroll(&mut self, lines: f32) {
        if self.scene.camera().is_tracking() {
            let progress = self.scene.scroll_progress() + lines * SCROLL_PER_LINE;
            self.scene.set_scroll_progress(progress);
        } else {
            self.scene.camera_mut().zoom(lines);
        }
    }

    /// Advance the scene and draw a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.start_time).as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let frame = self.scene.tick(elapsed, dt, self.assets.as_mut());
        if let Some(change) = frame.change {
            log::debug!("Showing vessel {}", change.current);
        }

        let Some(render_system) = &mut self.render_system else {
            return;
        };
        match render_system.render(&self.scene, elapsed) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory");
                self.shutdown(event_loop);
            }
            Err(e) => log::warn!("Render error: {e:?}"),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("vesselwave")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.render_config.window_width = size.width.max(1);
        self.render_config.window_height = size.height.max(1);

        match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.scene,
            self.render_config.clone(),
        )) {
            Ok(render_system) => self.render_system = Some(render_system),
            Err(e) => {
                log::error!("Failed to initialize renderer: {e:#}");
                event_loop.exit();
                return;
            }
        }

        log::info!("Arrows: next/previous, 1-9: select, F: free camera, wheel: spin/zoom, Esc: quit");
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(code, event_loop),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.mouse_pressed = state == ElementState::Pressed;
                if !self.mouse_pressed {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_cursor {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        self.scene.camera_mut().orbit(dx, dy);
                    }
                    self.last_cursor = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.handle_scroll(lines);
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("vesselwave starting");

    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.run_app(&mut app).context("Event loop terminated with an error")?;
    Ok(())
}
