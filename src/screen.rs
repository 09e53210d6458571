use bytemuck::{Pod, Zeroable};

/// Side length of the square tiles the evaluators work in.
///
/// Corresponds to `compute.wgsl#mandelbrot`'s `@workgroup_size(8, 8, 1)`.
pub const TILE_SIZE: u32 = 8;

#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether both dimensions are non-zero multiples of [`TILE_SIZE`].
    pub fn is_tileable(self) -> bool {
        !self.is_empty() && self.width % TILE_SIZE == 0 && self.height % TILE_SIZE == 0
    }

    /// The largest tileable size that fits inside `self`.
    pub fn rounded_to_tiles(self) -> Self {
        Self {
            width: self.width - self.width % TILE_SIZE,
            height: self.height - self.height % TILE_SIZE,
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Size {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}
