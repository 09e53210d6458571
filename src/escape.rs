//! Escape-time iteration and banded colour lookup.
//!
//! `compute.wgsl#mandelbrot` mirrors these two functions; keep them in step.

use crate::{colour::Colour, render::Banding};

/// Squared radius past which an orbit is known to diverge.
const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// Iterates `z -> z^2 + c` from `z = 0` and returns the 0-based iteration at
/// which `|z|` first exceeds 2, or `None` if it stays bounded for
/// `max_iterations` steps.
pub fn escape_time(c_real: f64, c_imag: f64, max_iterations: u32) -> Option<u32> {
    let (mut z_real, mut z_imag) = (0.0f64, 0.0f64);

    for iteration in 0..max_iterations {
        let next_real = z_real * z_real - z_imag * z_imag + c_real;
        z_imag = 2.0 * z_real * z_imag + c_imag;
        z_real = next_real;

        if z_real * z_real + z_imag * z_imag > ESCAPE_RADIUS_SQUARED {
            return Some(iteration);
        }
    }

    None
}

/// Colour for an escape result. Bounded points are black.
pub fn banded_colour(escape: Option<u32>, banding: Banding, gradient: &[Colour]) -> Colour {
    match escape {
        Some(iteration) => gradient[banding.gradient_index(iteration)],
        None => Colour::BLACK,
    }
}
