use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    animation,
    config::SceneConfig,
    controller::{normalized_pointer, SceneController},
    gfx::RenderEngine,
};

const WINDOW_WIDTH: u32 = 1200;
const WINDOW_HEIGHT: u32 = 800;

pub struct DioramaApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    controller: SceneController,
    stop: Arc<AtomicBool>,
}

impl DioramaApp {
    /// Creates the event loop and the scene; nothing is shown until [`run`](Self::run)
    pub fn new(config: SceneConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;

        let aspect = WINDOW_WIDTH as f32 / WINDOW_HEIGHT as f32;
        let controller =
            SceneController::new(config, aspect).context("Failed to start asset loader")?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                controller,
                stop: Arc::new(AtomicBool::new(false)),
            },
        })
    }

    /// Flag that ends the event loop at its next iteration once set
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.app_state.stop.clone()
    }

    /// Starts the asset loads and runs the event loop until stopped
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        self.app_state.controller.start_loading();

        event_loop
            .run_app(&mut self.app_state)
            .context("Event loop terminated with an error")
    }
}

impl AppState {
    fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title("diorama")
            .with_inner_size(winit::dpi::LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let window_clone = window.clone();
        let renderer =
            pollster::block_on(async move { RenderEngine::new(window_clone, width, height).await });

        match renderer {
            Ok(mut renderer) => {
                self.controller.resize(&mut renderer, width, height);
                self.render_engine = Some(renderer);
                self.window = Some(window);
            }
            Err(err) => {
                log::error!("Failed to initialise renderer: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        let Some(window) = self.window.as_ref() else {
            return;
        };

        self.controller
            .camera_manager_mut()
            .process_window_event(&event);

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                self.request_stop();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let size: (u32, u32) = window.inner_size().into();
                let ndc = normalized_pointer((position.x, position.y), size);
                self.controller.pointer_moved(ndc);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.controller.resize(render_engine, width, height);
            }
            WindowEvent::RedrawRequested => {
                self.controller.apply_load_events();
                self.controller.frame(animation::epoch_millis());

                match self.controller.render(render_engine) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Surface out of memory, stopping");
                        self.request_stop();
                    }
                    Err(err) => log::warn!("Frame skipped: {err}"),
                }
            }
            _ => (),
        }

        if self.stop.load(Ordering::Relaxed) {
            event_loop.exit();
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if self.window.is_none() {
            return;
        }

        self.controller
            .camera_manager_mut()
            .process_device_event(&event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.stop.load(Ordering::Relaxed) {
            event_loop.exit();
            return;
        }

        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
