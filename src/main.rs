//! Cloudtunnel - a flight through an endless volumetric cloud tunnel
//!
//! Clouds swirl around a winding path toward a sun that never gets closer,
//! with optional lightning that can follow the beat of a procedural soundtrack.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use cloudtunnel::audio::{AudioSignal, AudioSystem};
use cloudtunnel::cli::Args;
use cloudtunnel::display::DisplaySystem;
use cloudtunnel::lattice::LatticeSet;
use cloudtunnel::error::ParamError;
use cloudtunnel::params::{BeatConfig, FFTConfig, Preset, RenderConfig, SceneParameters};
use cloudtunnel::recording;
use cloudtunnel::renderer::Renderer;

/// Longest frame step fed to the camera (seconds); stalls do not teleport it
const MAX_FRAME_DT: f32 = 0.1;

/// Main application state
struct App {
    // Window and presentation
    window: Option<Arc<Window>>,
    display: Option<DisplaySystem>,

    // Scene
    renderer: Renderer,
    /// Defaults plus CLI overrides; every preset is merged onto this
    base: SceneParameters,
    preset: Preset,
    audio: Option<AudioSystem>,
    audio_enabled: bool,

    // Configuration
    render_config: RenderConfig,

    // Time tracking
    start_time: Instant,
    last_frame: Instant,
    fps_window: (Instant, u32),

    /// Fatal error that ended the event loop
    error: Option<anyhow::Error>,
}

impl App {
    fn new(
        renderer: Renderer,
        base: SceneParameters,
        preset: Preset,
        render_config: RenderConfig,
        audio_enabled: bool,
    ) -> Self {
        let now = Instant::now();
        Self {
            window: None,
            display: None,
            renderer,
            base,
            preset,
            audio: None,
            audio_enabled,
            render_config,
            start_time: now,
            last_frame: now,
            fps_window: (now, 0),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn start_audio(&mut self) {
        if !self.audio_enabled {
            return;
        }
        let beat = BeatConfig {
            threshold_ratio: self.renderer.params().beat_threshold,
            ..Default::default()
        };
        match AudioSystem::new(FFTConfig::default(), beat) {
            Ok(audio) => self.audio = Some(audio),
            Err(e) => log::warn!("audio disabled: {e}"),
        }
    }

    /// Hand new parameters to the renderer and the running beat detector
    fn apply_params(&mut self, params: SceneParameters) -> Result<(), ParamError> {
        self.renderer.set_params(params)?;
        if let Some(audio) = &self.audio {
            audio.set_beat_threshold(self.renderer.params().beat_threshold);
        }
        Ok(())
    }

    fn cycle_preset(&mut self) {
        let next = self.preset.next();
        match self.apply_params(next.apply(self.base.clone())) {
            Ok(()) => {
                self.preset = next;
                log::info!("preset: {next}");
            }
            Err(e) => log::warn!("preset {next} rejected: {e}"),
        }
    }

    fn toggle_lightning(&mut self) {
        let mut base = self.base.clone();
        base.lightning_enabled = !base.lightning_enabled;
        let enabled = base.lightning_enabled;
        if let Err(e) = self.apply_params(self.preset.apply(base.clone())) {
            log::warn!("lightning toggle rejected: {e}");
            return;
        }
        self.base = base;
        log::info!("lightning {}", if enabled { "on" } else { "off" });
    }

    /// Regenerate both lattices from the next seed
    fn reseed(&mut self) {
        let seed = self.render_config.lattice_seed.wrapping_add(1);
        let config = RenderConfig {
            lattice_seed: seed,
            ..self.render_config.clone()
        };
        match LatticeSet::generate(&config) {
            Ok(lattices) => {
                self.renderer.replace_lattices(lattices);
                self.render_config = config;
                log::info!("lattice seed: {seed}");
            }
            Err(e) => log::warn!("reseed rejected: {e}"),
        }
    }

    /// Render and present a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(display) = self.display.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;

        let time = self.start_time.elapsed().as_secs_f32();
        let signal = self
            .audio
            .as_ref()
            .map_or_else(AudioSignal::silent, AudioSystem::signal);

        let (surface_w, surface_h) = display.size();
        let (width, height) = self.render_config.framebuffer_size(surface_w, surface_h);
        let frame = self.renderer.render_frame(width, height, time, &signal);

        match display.present(&frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                display.resize(surface_w, surface_h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU out of memory"));
                return;
            }
            Err(e) => log::warn!("dropped frame: {e:?}"),
        }

        self.renderer.advance(dt);

        let (since, frames) = &mut self.fps_window;
        *frames += 1;
        let elapsed = since.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            log::debug!(
                "{:.1} fps at {}x{}, camera z={:.1}",
                *frames as f32 / elapsed,
                width,
                height,
                self.renderer.camera().z
            );
            self.fps_window = (Instant::now(), 0);
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
            .with_title("Cloudtunnel")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow!(e).context("failed to create window")),
        };

        let display = match pollster::block_on(DisplaySystem::new(Arc::clone(&window))) {
            Ok(display) => display,
            Err(e) => return self.fail(event_loop, anyhow!(e)),
        };

        self.start_audio();

        log::info!("cloudtunnel is running (ESC quit, R restart, P preset, L lightning, N reseed)");

        self.window = Some(window);
        self.display = Some(display);
        self.start_time = Instant::now();
        self.last_frame = self.start_time;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(display) = self.display.as_mut() {
                    display.resize(size.width, size.height);
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
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyR => self.renderer.restart(),
                KeyCode::KeyP => self.cycle_preset(),
                KeyCode::KeyL => self.toggle_lightning(),
                KeyCode::KeyN => self.reseed(),
                _ => {}
            },
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let base = args.base_params();
    let params = args.build_params().context("invalid scene parameters")?;
    let render_config = args.render_config();

    log::info!(
        "preset {}, {} steps, draw distance {}, seed {}",
        args.preset,
        params.render_steps,
        params.draw_distance,
        render_config.lattice_seed
    );

    let lattices = LatticeSet::generate(&render_config).context("failed to build noise lattices")?;
    let mut renderer = Renderer::new(params, lattices)?;

    if let Some(config) = args.recording_config() {
        let beat = BeatConfig {
            threshold_ratio: renderer.params().beat_threshold,
            ..Default::default()
        };
        let audio = recording::soundtrack(&config, FFTConfig::default(), beat)?;
        let summary = recording::record(
            &mut renderer,
            render_config.window_width,
            render_config.window_height,
            &config,
            audio,
        )?;
        log::info!("{} frames written to {}", summary.frames, summary.frames_dir.display());
        if let Some(path) = summary.audio_path {
            log::info!("soundtrack written to {}", path.display());
        }
        return Ok(());
    }

    let mut app = App::new(renderer, base, args.preset, render_config, !args.no_audio);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
