//! CPU escape-time evaluator.
//!
//! Runs entirely in `f64`, so it stays sharp long after the `f32` compute
//! shader has turned into blocks.

use log::trace;
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSliceMut};

use crate::{
    escape::{banded_colour, escape_time},
    render::RenderRequest,
    screen::TILE_SIZE,
};

pub struct CpuEvaluator {
    pool: rayon::ThreadPool,
}

impl CpuEvaluator {
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("mandelbrot-cpu-{}", index))
            .build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Fills `pixels` (RGBA8, row-major, row 0 at the top) for `request`.
    ///
    /// Work is split into strips of [`TILE_SIZE`] rows. Returns once every
    /// strip has been written.
    pub fn render_into(&self, request: &RenderRequest, pixels: &mut Vec<[u8; 4]>) {
        trace!("begin cpu render {:?}", request.size);

        let width = request.size.width as usize;
        pixels.resize(request.size.pixel_count(), [0; 4]);
        let max_iterations = request.banding.max_iterations();

        self.pool.install(|| {
            pixels
                .par_chunks_mut(width * TILE_SIZE as usize)
                .enumerate()
                .for_each(|(strip, strip_pixels)| {
                    let first_row = strip * TILE_SIZE as usize;
                    for (index, pixel) in strip_pixels.iter_mut().enumerate() {
                        let x = (index % width) as u32;
                        let row = (first_row + index / width) as u32;
                        let (c_real, c_imag) = request.plane_coordinate(x, row);
                        let escape = escape_time(c_real, c_imag, max_iterations);
                        *pixel =
                            banded_colour(escape, request.banding, request.gradient).to_rgba8();
                    }
                });
        });

        trace!("end cpu render");
    }

    pub fn render(&self, request: &RenderRequest) -> Vec<[u8; 4]> {
        let mut pixels = Vec::new();
        self.render_into(request, &mut pixels);
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colour::{Colour, Gradient, GradientTable},
        render::{self, Banding},
        screen::Size,
        viewport::ViewportState,
    };

    fn evaluator() -> CpuEvaluator {
        CpuEvaluator::new(2).unwrap()
    }

    #[test]
    fn pool_uses_the_requested_thread_count() {
        assert_eq!(evaluator().threads(), 2);
    }

    #[test]
    fn default_view_has_a_black_center_and_coloured_corners() {
        let size = Size::new(64, 48);
        let viewport = ViewportState::fit_height(0.0, 0.0, 4.0, size.height);
        let table = GradientTable::build(&Gradient::classic(), 256);
        let request = render::build(&viewport, size, &table, Banding::default()).unwrap();

        let pixels = evaluator().render(&request);

        assert_eq!(pixels.len(), 64 * 48);
        let center = pixels[24 * 64 + 32];
        assert_eq!(center, Colour::BLACK.to_rgba8());
        let corner = pixels[0];
        assert_eq!(corner, table.as_slice()[0].to_rgba8());
    }

    #[test]
    fn far_away_view_is_the_first_gradient_entry() {
        let size = Size::new(16, 8);
        let viewport = ViewportState::new(100.0, 100.0, 0.01);
        let table = GradientTable::build(&Gradient::fire(), 8);
        let banding = Banding {
            iterations_per_group: 8,
            num_groups: 2,
        };
        let request = render::build(&viewport, size, &table, banding).unwrap();

        let pixels = evaluator().render(&request);

        assert!(pixels.iter().all(|pixel| *pixel == table.as_slice()[0].to_rgba8()));
    }

    #[test]
    fn rows_run_top_to_bottom() {
        // Only the bottom row of this view lies on the real axis inside the set.
        let size = Size::new(8, 8);
        let viewport = ViewportState::new(-0.5, 4.0, 1.0);
        let table = GradientTable::build(&Gradient::ice(), 16);
        let banding = Banding {
            iterations_per_group: 16,
            num_groups: 4,
        };
        let request = render::build(&viewport, size, &table, banding).unwrap();

        let pixels = evaluator().render(&request);

        // Bottom row, x = 4: c = (-0.5, 0.0).
        assert_eq!(pixels[7 * 8 + 4], Colour::BLACK.to_rgba8());
        // Top row, x = 4: c = (-0.5, 7.0).
        assert_ne!(pixels[4], Colour::BLACK.to_rgba8());
    }

    #[test]
    fn render_into_reuses_the_buffer() {
        let size = Size::new(8, 8);
        let viewport = ViewportState::new(0.0, 0.0, 0.5);
        let table = GradientTable::build(&Gradient::ice(), 4);
        let banding = Banding {
            iterations_per_group: 4,
            num_groups: 1,
        };
        let request = render::build(&viewport, size, &table, banding).unwrap();
        let mut pixels = vec![[1, 2, 3, 4]; 200];

        evaluator().render_into(&request, &mut pixels);

        assert_eq!(pixels.len(), 64);
        assert_eq!(pixels, evaluator().render(&request));
    }
}
