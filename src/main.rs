//! Gerstner ocean - an animated wave surface driven by either a CPU loop or a
//! compute shader, switchable at runtime.
//!
//! Keys: `1` toggles the wave backend, `2` toggles wireframe, `Esc` quits.
//! Left-drag orbits the camera, the scroll wheel zooms.

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

use gerstner_ocean::camera::OrbitCamera;
use gerstner_ocean::cli::Args;
use gerstner_ocean::ocean::Backend;
use gerstner_ocean::params::{CameraParams, RenderConfig, SurfaceConfig};
use gerstner_ocean::rendering::{RenderSystem, SurfaceRenderer};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    ocean: Option<SurfaceRenderer>,

    camera: OrbitCamera,

    // Configuration
    render_config: RenderConfig,
    surface_config: SurfaceConfig,
    initial_backend: Backend,
    initial_wireframe: bool,

    // Time tracking
    start_time: Instant,

    // Fatal error raised inside the event loop
    error: Option<anyhow::Error>,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let surface_config = args
            .build_surface_config()
            .context("failed to build surface configuration")?;

        Ok(Self {
            window: None,
            render_system: None,
            ocean: None,
            camera: OrbitCamera::new(CameraParams::default()),
            render_config: RenderConfig::default(),
            surface_config,
            initial_backend: args.backend,
            initial_wireframe: args.wireframe,
            start_time: Instant::now(),
            error: None,
        })
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Gerstner Ocean")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("failed to create window")?,
        );

        let mut render_system = pollster::block_on(RenderSystem::new(Arc::clone(&window)))
            .context("failed to initialize rendering")?;
        render_system.set_clear_color(self.render_config.clear_color);

        let mut ocean = SurfaceRenderer::initialize(
            Arc::clone(&render_system.gpu),
            self.surface_config.clone(),
            self.initial_backend,
            render_system.targets(),
        )
        .context("failed to initialize ocean surface")?;
        if self.initial_wireframe {
            ocean.set_wireframe(true);
        }

        log::info!("Press 1 to toggle backend, 2 to toggle wireframe, ESC to quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.ocean = Some(ocean);
        self.update_title();
        self.start_time = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn update_title(&self) {
        let (Some(window), Some(ocean)) = (&self.window, &self.ocean) else {
            return;
        };
        let mode = if ocean.is_wireframe() {
            "wireframe"
        } else {
            "solid"
        };
        window.set_title(&format!(
            "Gerstner Ocean - {} backend, {}x{} grid, {} [1: backend, 2: wireframe]",
            ocean.active_backend(),
            ocean.rows(),
            ocean.cols(),
            mode
        ));
    }

    fn toggle_backend(&mut self) {
        let Some(ocean) = self.ocean.as_mut() else {
            return;
        };
        let next = ocean.active_backend().toggled();
        if let Err(e) = ocean.set_active_backend(next) {
            log::warn!("Staying on {} backend: {}", ocean.active_backend(), e);
        }
        self.update_title();
    }

    fn toggle_wireframe(&mut self) {
        let Some(ocean) = self.ocean.as_mut() else {
            return;
        };
        let enabled = ocean.set_wireframe(!ocean.is_wireframe());
        log::info!("Wireframe {}", if enabled { "on" } else { "off" });
        self.update_title();
    }

    /// Update the simulation and render a single frame
    fn render_frame(&mut self) -> anyhow::Result<()> {
        let (Some(render_system), Some(ocean)) = (&self.render_system, self.ocean.as_mut()) else {
            return Ok(());
        };

        let time_s = self.start_time.elapsed().as_secs_f32();
        ocean.update(time_s).context("wave update failed")?;

        let view_state = self
            .camera
            .view_state(&self.render_config, render_system.aspect_ratio());

        match render_system.render(ocean, &view_state) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    let (width, height) = render_system.size();
                    render_system.resize(width, height);
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                anyhow::bail!("surface out of memory");
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
        Ok(())
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
        if let Err(e) = self.init_graphics(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Digit1 | KeyCode::Numpad1 => self.toggle_backend(),
                KeyCode::Digit2 | KeyCode::Numpad2 => self.toggle_wireframe(),
                _ => {}
            },
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.camera.set_dragging(state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                self.camera.cursor_moved(position.x, position.y)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                };
                self.camera.zoom(lines);
            }
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_frame() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Gerstner ocean starting ({} backend)", args.backend);

    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
