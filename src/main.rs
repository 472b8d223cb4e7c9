//! Spindrift - GPU spectral ocean surface simulation
//!
//! Host render loop: one simulation tick per rendered frame. The ocean
//! module does all the work; this binary owns the window, the camera,
//! and key handling.

use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use spindrift::camera::CameraSystem;
use spindrift::cli::Args;
use spindrift::ocean::{mesh::OceanGrid, pipeline, OceanSystem};
use spindrift::params::{OceanParams, RenderConfig};
use spindrift::rendering::{save_field_png, RenderSystem, SceneUniforms};

use clap::Parser;

/// Grid cells per side of the render mesh (independent of the
/// simulation resolution)
const MESH_CELLS: usize = 255;

/// Main application state
struct App {
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    ocean: Option<OceanSystem>,

    ocean_params: OceanParams,
    camera: CameraSystem,
    render_config: RenderConfig,
    args: Args,

    start_time: Instant,
    frame_num: usize,
}

impl App {
    fn new(args: Args) -> Self {
        let ocean_params = args.ocean_params();
        let camera = CameraSystem::new(args.parse_camera_preset());

        Self {
            window: None,
            render_system: None,
            ocean: None,
            ocean_params,
            camera,
            render_config: RenderConfig::default(),
            args,
            start_time: Instant::now(),
            frame_num: 0,
        }
    }

    fn adjust_wind(&mut self, delta: f32) {
        let Some(ocean) = &mut self.ocean else { return };
        let Some(render_system) = &self.render_system else {
            return;
        };
        let speed = (ocean.params().wind_speed_m_per_s + delta).max(1.0);
        let direction = ocean.params().wind_direction;
        if let Err(e) = ocean.set_wind(&render_system.queue, speed, direction) {
            log::warn!("wind change rejected: {e}");
        }
    }

    fn dump_displacement(&self) {
        let (Some(ocean), Some(render_system)) = (&self.ocean, &self.render_system) else {
            return;
        };
        let Some(raw) = ocean.read_displacement_raw(&render_system.device, &render_system.queue)
        else {
            log::warn!("displacement dump is only available in spectral mode");
            return;
        };

        // Channel 1 of each RGBA16F texel is the vertical displacement
        let heights: Vec<f32> = raw
            .chunks_exact(8)
            .map(|texel| pipeline::f16_bits_to_f32(u16::from_le_bytes([texel[2], texel[3]])))
            .collect();

        let n = ocean.params().resolution;
        let path = format!("displacement_{:05}.png", self.frame_num);
        match save_field_png(&path, &heights, n, n) {
            Ok(()) => log::info!("wrote {path}"),
            Err(e) => log::error!("{e}"),
        }
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        let Some(render_system) = &self.render_system else {
            return;
        };
        let (Some(ocean), Some(_window)) = (&mut self.ocean, &self.window) else {
            return;
        };

        let time_s = self.start_time.elapsed().as_secs_f32();
        let view_proj = self.camera.view_proj(time_s, &self.render_config);

        let uniforms = SceneUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            sun_direction: self.render_config.sun_direction,
            time: time_s,
            deep_color: self.render_config.deep_color,
            patch_size: ocean.params().patch_size_m,
            shallow_color: self.render_config.shallow_color,
            amplitude: ocean.params().amplitude_m,
        };
        render_system.update_scene_uniforms(&uniforms);

        if let Err(e) = render_system.render(ocean, time_s, self.frame_num) {
            log::error!("render error: {e:?}");
        }
        self.frame_num += 1;
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Spindrift - Spectral Ocean")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let grid = OceanGrid::new(MESH_CELLS, self.ocean_params.patch_size_m);
        let recording = self.args.create_recording_config();

        let mut render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &grid,
            recording,
        ))
        .unwrap_or_else(|e| {
            log::error!("renderer init failed: {e}");
            std::process::exit(1);
        });

        let ocean = OceanSystem::new(
            &render_system.device,
            &render_system.queue,
            self.ocean_params.clone(),
        )
        .unwrap_or_else(|e| {
            log::error!("invalid simulation parameters: {e}");
            std::process::exit(1);
        });
        render_system.bind_ocean(&ocean);

        log::info!("running; ESC quits, up/down adjust wind, D dumps the displacement map");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.ocean = Some(ocean);
        self.start_time = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                    self.render_config.window_width = size.width.max(1);
                    self.render_config.window_height = size.height.max(1);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::ArrowUp => self.adjust_wind(1.0),
                KeyCode::ArrowDown => self.adjust_wind(-1.0),
                KeyCode::KeyD => self.dump_displacement(),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.render_frame();

                // Recording runs for a fixed number of frames, then exits
                if let Some(record_secs) = self.args.record {
                    let total = (record_secs * 60.0).ceil() as usize;
                    if self.frame_num >= total {
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let mut app = App::new(args);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);
}
