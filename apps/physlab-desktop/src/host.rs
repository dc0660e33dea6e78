use physlab_kernel::{LabWorld, SessionError, SessionHost};
use physlab_render_wgpu::WgpuRenderer;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

/// Window surface, device and renderers.
///
/// The session binds each freshly built lab to it and unbinds before
/// tearing the lab down.
pub struct GpuHost {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub renderer: WgpuRenderer,
    pub egui_renderer: egui_wgpu::Renderer,
    pub panel_open: bool,
}

impl GpuHost {
    pub fn create(event_loop: &ActiveEventLoop, title: &str) -> Result<Self, SessionError> {
        let unavailable = |what: &str, e: &dyn std::fmt::Display| SessionError::SurfaceUnavailable(format!("{what}: {e}"));

        let attrs = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| unavailable("create window", &e))?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| unavailable("create surface", &e))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| SessionError::SurfaceUnavailable("no compatible GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("physlab_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| unavailable("request device", &e))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or_else(|| SessionError::SurfaceUnavailable("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, format, config.width, config.height);
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        tracing::info!(backend = adapter.get_info().backend.to_str(), "GPU initialized");

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_renderer,
            panel_open: false,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}

impl SessionHost for GpuHost {
    fn acquire(&mut self, lab: &LabWorld) -> Result<(), SessionError> {
        self.renderer.bind_scene(&self.device, lab.scene());
        self.panel_open = true;
        self.window
            .set_title(&format!("Physics Lab: {}", lab.kind().title()));
        Ok(())
    }

    fn release(&mut self) {
        self.renderer.unbind_scene();
        self.panel_open = false;
    }
}
