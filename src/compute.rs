//! GPU escape-time evaluator (`compute.wgsl#mandelbrot`).

use bytemuck::{Pod, Zeroable};
use log::trace;

use crate::{
    buffer::{Storage, Uniform},
    colour::Colour,
    present::{RenderTarget, TARGET_FORMAT},
    render::RenderRequest,
    screen::{self, TILE_SIZE},
};

/**
Dispatch size for `compute.wgsl#mandelbrot`

[WGSL compute shader workgroups reference](https://www.w3.org/TR/WGSL/#compute-shader-workgroups)

The entrypoint is declared with `@workgroup_size(8, 8, 1)`, so one workgroup
covers an 8x8 tile of pixels and a dispatch of `(x, y, 1)` covers
`8x * 8y` pixels. Each invocation handles the pixel at its
`global_invocation_id.xy`.

Render sizes are whole tiles (see [`screen::Size::is_tileable`]), which keeps
the grid exactly the size of the image: `(width / 8, height / 8, 1)`. The
shader still bounds-checks, so a partial tile would only waste invocations.
*/
pub fn mandelbrot_dispatch_size(size: screen::Size) -> (u32, u32, u32) {
    (size.width / TILE_SIZE, size.height / TILE_SIZE, 1)
}

/// Uniform block for `compute.wgsl#Params`.
///
/// The shader iterates in `f32`, so the `f64` request is narrowed here and
/// nowhere earlier.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub width: u32,
    pub height: u32,
    pub iterations_per_group: u32,
    pub num_groups: u32,
    pub origin_real: f32,
    pub origin_imag: f32,
    pub pixel_size: f32,
    _padding: u32,
}

impl Params {
    pub fn from_request(request: &RenderRequest) -> Self {
        Self {
            width: request.size.width,
            height: request.size.height,
            iterations_per_group: request.banding.iterations_per_group,
            num_groups: request.banding.num_groups,
            origin_real: request.origin_real as f32,
            origin_imag: request.origin_imag as f32,
            pixel_size: request.pixel_size as f32,
            _padding: 0,
        }
    }
}

pub struct GpuEvaluator {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params: Uniform<Params>,
    gradient: Storage<Colour>,
    bind_group: wgpu::BindGroup,
}

impl GpuEvaluator {
    pub fn new(device: &wgpu::Device, target: &RenderTarget) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("compute-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("compute.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("compute-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: TARGET_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("compute-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("compute-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: "mandelbrot",
        });

        let params = Uniform::new(device, "params-buffer", Params::zeroed());
        let gradient = Storage::new(device, "gradient-buffer", &[Colour::BLACK]);
        let bind_group = create_bind_group(device, &bind_group_layout, target, &params, &gradient);

        Self {
            pipeline,
            bind_group_layout,
            params,
            gradient,
            bind_group,
        }
    }

    /// Rebinds after the render target was recreated.
    pub fn set_target(&mut self, device: &wgpu::Device, target: &RenderTarget) {
        self.bind_group = create_bind_group(
            device,
            &self.bind_group_layout,
            target,
            &self.params,
            &self.gradient,
        );
    }

    /// Uploads the request and records the compute pass into `command_encoder`.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        command_encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        request: &RenderRequest,
    ) {
        trace!("encoding compute pass for {:?}", request.size);

        self.params.write(queue, Params::from_request(request));

        if self.gradient.len() == request.gradient.len() {
            self.gradient.write(queue, request.gradient);
        } else {
            let gradient = Storage::new(device, "gradient-buffer", request.gradient);
            std::mem::replace(&mut self.gradient, gradient).destroy();
            self.set_target(device, target);
        }

        let (x, y, z) = mandelbrot_dispatch_size(request.size);

        command_encoder.push_debug_group("compute-pass");
        {
            let mut compute_pass = command_encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute-pass"),
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_group, &[]);
            compute_pass.insert_debug_marker("mandelbrot");
            compute_pass.dispatch_workgroups(x, y, z);
        }
        command_encoder.pop_debug_group();
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    target: &RenderTarget,
    params: &Uniform<Params>,
    gradient: &Storage<Colour>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("compute-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(target.view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: params.binding_resource(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: gradient.binding_resource(),
            },
        ],
    })
}
