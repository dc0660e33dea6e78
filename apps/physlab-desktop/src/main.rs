#[cfg(feature = "audio")]
mod audio;
mod host;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use host::GpuHost;
use physlab_input::Key;
use physlab_kernel::{FrameStatus, LabConfig, LabKind, Session, SilentSound, SoundEffect};
use physlab_render::Renderer;
use physlab_render_wgpu::FramePacker;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use ui::{PanelModel, UiCommand};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

#[derive(Parser)]
#[command(name = "physlab-desktop", about = "Interactive physics labs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Lab to open: barrier-course or vehicle-arena
    #[arg(long, default_value = "barrier-course")]
    lab: LabKind,

    /// YAML file overriding lab defaults; its `kind` wins over --lab
    #[arg(long)]
    config: Option<PathBuf>,
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::KeyW,
        KeyCode::KeyA => Key::KeyA,
        KeyCode::KeyS => Key::KeyS,
        KeyCode::KeyD => Key::KeyD,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        _ => return None,
    })
}

fn sound_output() -> Box<dyn SoundEffect> {
    #[cfg(feature = "audio")]
    {
        match audio::RodioSound::open() {
            Ok(sound) => return Box::new(sound),
            Err(e) => tracing::warn!(error = %e, "audio output unavailable, sounds muted"),
        }
    }
    Box::new(SilentSound::checking_files())
}

struct App {
    base: LabConfig,
    session: Option<Session<GpuHost>>,
    egui_ctx: egui::Context,
    egui_winit: Option<egui_winit::State>,
    dragging: bool,
    last_frame: Instant,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(base: LabConfig) -> Self {
        Self {
            base,
            session: None,
            egui_ctx: egui::Context::default(),
            egui_winit: None,
            dragging: false,
            last_frame: Instant::now(),
            fatal: None,
        }
    }

    /// A command-line config applies to its own lab; the other lab uses defaults.
    fn config_for(&self, kind: LabKind) -> LabConfig {
        if self.base.kind == kind {
            self.base.clone()
        } else {
            LabConfig::for_kind(kind)
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.fatal = Some(err);
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
        event_loop.exit();
    }

    fn apply(&mut self, command: UiCommand) -> Result<()> {
        match command {
            UiCommand::SwitchLab(kind) => {
                let config = self.config_for(kind);
                if let Some(session) = self.session.as_mut() {
                    session
                        .switch_lab(config)
                        .with_context(|| format!("switching to {kind}"))?;
                }
            }
            UiCommand::Act(action) => {
                if let Some(session) = self.session.as_mut() {
                    session
                        .handle(action)
                        .with_context(|| format!("handling {action:?}"))?;
                }
            }
        }
        Ok(())
    }

    /// Tick, draw the scene and the panel, then apply panel commands.
    /// Returns whether another frame should follow.
    fn redraw(&mut self) -> Result<bool> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if let FrameStatus::Stopped = session.tick(dt)? {
            return Ok(false);
        }
        let mut model = PanelModel::capture(session);

        let (host, world) = session.host_and_world();
        let Some(world) = world else {
            return Ok(false);
        };
        world.camera_mut().aspect = host.aspect();
        let frame = FramePacker.render(world.scene(), world.camera());

        let output = match host.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                host.surface.configure(&host.device, &host.config);
                return Ok(true);
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return Ok(true);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        host.renderer.draw(&host.device, &host.queue, &view, &frame);

        let mut commands = Vec::new();
        if let Some(egui_winit) = self.egui_winit.as_mut() {
            let raw_input = egui_winit.take_egui_input(&host.window);
            let full_output = self.egui_ctx.run(raw_input, |ctx| {
                if let (true, Some(model)) = (host.panel_open, model.as_mut()) {
                    model.draw(ctx, &mut commands);
                }
            });
            egui_winit.handle_platform_output(&host.window, full_output.platform_output);

            let paint_jobs = self
                .egui_ctx
                .tessellate(full_output.shapes, full_output.pixels_per_point);
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [host.config.width, host.config.height],
                pixels_per_point: full_output.pixels_per_point,
            };

            for (id, image_delta) in &full_output.textures_delta.set {
                host.egui_renderer
                    .update_texture(&host.device, &host.queue, *id, image_delta);
            }
            let mut encoder = host
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("egui_encoder"),
                });
            host.egui_renderer.update_buffers(
                &host.device,
                &host.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                host.egui_renderer
                    .render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            host.queue.submit(std::iter::once(encoder.finish()));
            for id in &full_output.textures_delta.free {
                host.egui_renderer.free_texture(id);
            }
        }

        output.present();

        for command in commands {
            self.apply(command)?;
        }
        Ok(self.session.as_ref().is_some_and(Session::is_running))
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        let started = GpuHost::create(event_loop, "Physics Lab")
            .and_then(|host| Session::start(host, self.base.clone()))
            .context("starting lab session");
        match started {
            Ok(session) => {
                let window = session.host().window.clone();
                self.session = Some(session.with_sound(sound_output()));
                self.egui_winit = Some(egui_winit::State::new(
                    self.egui_ctx.clone(),
                    egui::ViewportId::ROOT,
                    &window,
                    Some(window.scale_factor() as f32),
                    None,
                    None,
                ));
                self.last_frame = Instant::now();
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let (Some(egui_winit), Some(session)) = (self.egui_winit.as_mut(), self.session.as_ref()) {
            let response = egui_winit.on_window_event(&session.host().window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(mut session) = self.session.take() {
                    session.shutdown();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(session) = self.session.as_mut() {
                    session.host_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let (Some(key), Some(session)) = (map_key(code), self.session.as_mut()) {
                    session.key_event(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                if let Some(world) = self.session.as_mut().and_then(Session::world_mut) {
                    world.camera_mut().zoom(amount);
                }
            }
            // Only a running session re-arms the redraw chain.
            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(true) => {
                    if let Some(session) = self.session.as_ref() {
                        session.host().window.request_redraw();
                    }
                }
                Ok(false) => {}
                Err(e) => self.fail(event_loop, e),
            },
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if !self.dragging {
                return;
            }
            if let Some(world) = self.session.as_mut().and_then(Session::world_mut) {
                world.camera_mut().rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let base = match &cli.config {
        Some(path) => LabConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => LabConfig::for_kind(cli.lab),
    };
    tracing::info!(lab = %base.kind, "physlab-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(base);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
