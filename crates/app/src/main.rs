//! prism - main entry point.
//!
//! Owns the winit event loop and forwards window and device events to the
//! renderer: resizes (including zero sizes while minimized) feed the
//! surface lifecycle, keyboard and raw mouse motion feed the camera, and
//! each redraw runs one frame.

use anyhow::Result;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use prism_core::FrameTimer;
use prism_platform::{InputState, KeyCode, Window};
use prism_render::Renderer;

/// Frames between periodic frame-rate log lines.
const FPS_LOG_INTERVAL: u64 = 300;

struct App {
    window: Option<Window>,
    renderer: Option<Renderer>,
    input: InputState,
    timer: FrameTimer,
    frame_count: u64,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            input: InputState::new(),
            timer: FrameTimer::new(),
            frame_count: 0,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match Window::new(event_loop, 1280, 720, "prism") {
                Ok(window) => match Renderer::new(&window) {
                    Ok(renderer) => {
                        info!("Initialization complete, entering main loop");
                        window.set_cursor_captured(true);
                        self.renderer = Some(renderer);
                        self.window = Some(window);
                        self.timer.reset();
                    }
                    Err(e) => {
                        error!("Failed to create renderer: {}", e);
                        event_loop.exit();
                    }
                },
                Err(e) => {
                    error!("Failed to create window: {}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                // Zero sizes pass through; the renderer suspends until the
                // window regains area
                if let Some(ref mut renderer) = self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.timer.delta_secs();

                if let Some(ref mut renderer) = self.renderer {
                    renderer.update(&self.input, dt);
                    if let Err(e) = renderer.render_frame() {
                        error!("Fatal render error: {}", e);
                        event_loop.exit();
                        return;
                    }
                }

                self.frame_count += 1;
                if self.frame_count % FPS_LOG_INTERVAL == 0 {
                    info!("Frame rate: {:.1} fps", self.timer.fps());
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }

                    if key == KeyCode::Escape && event.state.is_pressed() {
                        info!("Escape pressed, shutting down");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.on_mouse_delta(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.input.begin_frame();
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    prism_core::init_logging();
    info!("Starting prism");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
