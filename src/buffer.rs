/*!
Typed `wgpu` buffers.

A raw `wgpu::Buffer` is just bytes; nothing stops a caller from writing a
`Params` into the buffer the shader reads as `array<vec4<f32>>`. These
wrappers tie each buffer to one [`bytemuck::Pod`] element type.
*/

use std::marker::PhantomData;

use wgpu::util::DeviceExt;

/// A single value, bound as a uniform.
pub struct Uniform<A> {
    buffer: wgpu::Buffer,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod> Uniform<A> {
    pub fn new(device: &wgpu::Device, label: &str, contents: A) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&contents),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            buffer,
            phantom_data: PhantomData,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, contents: A) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&contents));
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

/// A fixed-length array, bound as a read-only storage buffer.
pub struct Storage<A> {
    buffer: wgpu::Buffer,
    len: usize,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod> Storage<A> {
    pub fn new(device: &wgpu::Device, label: &str, contents: &[A]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            buffer,
            len: contents.len(),
            phantom_data: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Overwrites the contents. `contents` must have exactly [`Self::len`]
    /// elements; a different length needs a new buffer.
    pub fn write(&self, queue: &wgpu::Queue, contents: &[A]) {
        debug_assert_eq!(contents.len(), self.len);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(contents));
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn destroy(self) {
        self.buffer.destroy()
    }
}
