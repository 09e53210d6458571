//! Owns the `wgpu` device and surface and puts evaluated frames on screen.

use std::num::NonZeroU32;

use log::{debug, info};
use thiserror::Error;
use winit::window::Window;

use crate::{
    compute::GpuEvaluator,
    config::Backend,
    cpu::CpuEvaluator,
    present::{Presenter, RenderTarget},
    render::RenderRequest,
    scheduler::{Dispatch, DispatchError},
    screen,
};

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("no graphics adapter can present to this window")]
    NoAdapter,
    #[error("the surface supports no texture formats on this adapter")]
    NoSurfaceFormat,
    #[error("failed to open the graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to start CPU worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

enum Evaluator {
    Gpu(GpuEvaluator),
    Cpu {
        evaluator: CpuEvaluator,
        pixels: Vec<[u8; 4]>,
    },
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_configuration: wgpu::SurfaceConfiguration,
    surface_size: screen::Size,
    target: RenderTarget,
    presenter: Presenter,
    evaluator: Evaluator,
}

impl Renderer {
    pub fn new(window: &Window, backend: Backend, threads: usize) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(wgpu::Backends::all());

        let surface_size = screen::Size::from(window.inner_size());
        let surface = unsafe { instance.create_surface(window) };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or(RendererError::NoAdapter)?;
        info!("using adapter {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        // The evaluators write display-ready colour values, so a linear
        // surface shows them unchanged.
        let formats = surface.get_supported_formats(&adapter);
        let format = formats
            .iter()
            .copied()
            .find(|format| !format.describe().srgb)
            .or_else(|| formats.first().copied())
            .ok_or(RendererError::NoSurfaceFormat)?;
        debug!("surface format {:?}", format);

        let surface_configuration = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: surface_size.width.max(1),
            height: surface_size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
        };
        surface.configure(&device, &surface_configuration);

        let target = RenderTarget::new(&device, surface_size.rounded_to_tiles());
        let presenter = Presenter::new(&device, format, &target);

        let evaluator = match backend {
            Backend::Gpu => Evaluator::Gpu(GpuEvaluator::new(&device, &target)),
            Backend::Cpu => {
                let evaluator = CpuEvaluator::new(threads)?;
                info!("evaluating on {} CPU threads", evaluator.threads());
                Evaluator::Cpu {
                    evaluator,
                    pixels: Vec::new(),
                }
            }
        };

        Ok(Self {
            surface,
            device,
            queue,
            surface_configuration,
            surface_size,
            target,
            presenter,
            evaluator,
        })
    }

    pub fn surface_size(&self) -> screen::Size {
        self.surface_size
    }

    /// Size of the image the evaluators produce: the surface rounded down to
    /// whole tiles. The blit stretches it over the surface.
    pub fn render_size(&self) -> screen::Size {
        self.target.size()
    }

    pub fn resize(&mut self, size: screen::Size) {
        debug!("resizing to {:?}", size);
        self.surface_size = size;

        if !size.is_empty() {
            self.surface_configuration.width = size.width;
            self.surface_configuration.height = size.height;
            self.reconfigure();
        }

        let render_size = size.rounded_to_tiles();
        if render_size == self.target.size() {
            return;
        }

        let target = RenderTarget::new(&self.device, render_size);
        std::mem::replace(&mut self.target, target).destroy();

        self.presenter.set_target(&self.device, &self.target);
        if let Evaluator::Gpu(evaluator) = &mut self.evaluator {
            evaluator.set_target(&self.device, &self.target);
        }
    }

    /// Applies the current surface configuration again, e.g. after the
    /// surface was lost.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_configuration);
    }

    /// Blits the last completed frame to the window.
    pub fn present(&self) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut command_encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("present-command-encoder"),
            });
        self.presenter.draw(&mut command_encoder, &surface_texture_view);

        self.queue.submit([command_encoder.finish()]);
        surface_texture.present();
        Ok(())
    }
}

impl Dispatch for Renderer {
    /// Work is submitted to the queue before returning, and presentation is
    /// submitted after it, so the next [`Renderer::present`] shows this frame.
    fn dispatch(&mut self, request: &RenderRequest) -> Result<(), DispatchError> {
        if request.size != self.target.size() {
            return Err(DispatchError::TargetSize {
                target: self.target.size(),
                request: request.size,
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        match &mut self.evaluator {
            Evaluator::Gpu(evaluator) => {
                let mut command_encoder =
                    self.device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("compute-command-encoder"),
                        });
                evaluator.encode(
                    &self.device,
                    &self.queue,
                    &mut command_encoder,
                    &self.target,
                    request,
                );
                self.queue.submit([command_encoder.finish()]);
            }
            Evaluator::Cpu { evaluator, pixels } => {
                evaluator.render_into(request, pixels);
                self.queue.write_texture(
                    wgpu::ImageCopyTexture {
                        texture: self.target.texture(),
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    bytemuck::cast_slice(pixels),
                    wgpu::ImageDataLayout {
                        offset: 0,
                        bytes_per_row: NonZeroU32::new(request.size.width * 4),
                        rows_per_image: None,
                    },
                    wgpu::Extent3d {
                        width: request.size.width,
                        height: request.size.height,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(error) => Err(DispatchError::Device(error)),
            None => Ok(()),
        }
    }
}
