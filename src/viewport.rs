//! Double-precision view over the complex plane.
//!
//! Everything in here stays in `f64`. Rounding any of these values through
//! `f32` makes the view snap to a coarse grid after a few hundred zoom steps.

use log::warn;

/// Smallest pixel size the view accepts.
pub const MIN_PIXEL_SIZE: f64 = f64::MIN_POSITIVE;

/// Stands in for an infinite pixel size.
pub const MAX_PIXEL_SIZE: f64 = f64::MAX;

/// Upper bound on the time step a single zoom call applies.
pub const MAX_ZOOM_STEP_SECONDS: f64 = 0.5;

/// Fraction of the screen height panned per second.
const PAN_SCREENS_PER_SECOND_DIVISOR: u32 = 5;

/// Which way a zoom moves the view.
///
/// `Out` grows the pixel size (more of the plane on screen), `In` shrinks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Multiplier applied to the pixel size delta.
    pub fn sign(self) -> f64 {
        match self {
            ZoomDirection::In => -1.0,
            ZoomDirection::Out => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    center_real: f64,
    center_imag: f64,
    pixel_size: f64,
}

impl ViewportState {
    pub fn new(center_real: f64, center_imag: f64, pixel_size: f64) -> Self {
        Self {
            center_real,
            center_imag,
            pixel_size: clamp_pixel_size(pixel_size),
        }
    }

    /// A view centered on `(center_real, center_imag)` that shows `view_height`
    /// plane units across `screen_height` pixels.
    pub fn fit_height(
        center_real: f64,
        center_imag: f64,
        view_height: f64,
        screen_height: u32,
    ) -> Self {
        Self::new(center_real, center_imag, view_height / screen_height.max(1) as f64)
    }

    pub fn center_real(&self) -> f64 {
        self.center_real
    }

    pub fn center_imag(&self) -> f64 {
        self.center_imag
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Moves the center by `screen_height / 5` pixels per second in each of
    /// the given directions.
    pub fn pan(
        &mut self,
        direction_x: i8,
        direction_y: i8,
        screen_height: u32,
        elapsed_seconds: f64,
    ) {
        let move_speed = (screen_height / PAN_SCREENS_PER_SECOND_DIVISOR) as f64;
        let move_amount = move_speed * self.pixel_size * elapsed_seconds;

        self.center_real += direction_x as f64 * move_amount;
        self.center_imag += direction_y as f64 * move_amount;
    }

    /// Scales the pixel size by `1 ± min(elapsed_seconds, 0.5)`, which roughly
    /// doubles or halves the view every second of continuous input.
    pub fn zoom(&mut self, direction: ZoomDirection, elapsed_seconds: f64) {
        let step = elapsed_seconds.min(MAX_ZOOM_STEP_SECONDS);
        let pixel_size = self.pixel_size + direction.sign() * self.pixel_size * step;

        self.pixel_size = clamp_pixel_size(pixel_size);
    }

    /// Moves the center to a screen point given in bottom-left-origin pixels.
    pub fn recenter_on(
        &mut self,
        screen_point_x: f64,
        screen_point_y: f64,
        screen_width: u32,
        screen_height: u32,
    ) {
        let offset_x = screen_point_x - screen_width as f64 / 2.0;
        let offset_y = screen_point_y - screen_height as f64 / 2.0;

        self.center_real += offset_x * self.pixel_size;
        self.center_imag += offset_y * self.pixel_size;
    }

    pub fn reset(&mut self, initial: ViewportState) {
        *self = initial;
    }
}

fn clamp_pixel_size(pixel_size: f64) -> f64 {
    if pixel_size.is_nan() || pixel_size < MIN_PIXEL_SIZE {
        warn!("pixel size {} clamped to {}", pixel_size, MIN_PIXEL_SIZE);
        MIN_PIXEL_SIZE
    } else if pixel_size.is_infinite() {
        warn!("pixel size {} clamped to {}", pixel_size, MAX_PIXEL_SIZE);
        MAX_PIXEL_SIZE
    } else {
        pixel_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-12 * expected.abs().max(1.0),
            "expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn fit_height_shows_the_requested_plane_height() {
        let viewport = ViewportState::fit_height(0.0, 0.0, 4.0, 600);

        assert_eq!(viewport.pixel_size(), 4.0 / 600.0);
    }

    #[test]
    fn pan_right_for_one_second() {
        let mut viewport = ViewportState::new(0.0, 0.0, 4.0 / 600.0);

        viewport.pan(1, 0, 600, 1.0);

        assert_close(viewport.center_real(), 0.8);
        assert_eq!(viewport.center_imag(), 0.0);
    }

    #[test]
    fn pan_uses_whole_pixels_per_second() {
        let mut viewport = ViewportState::new(0.0, 0.0, 1.0);

        viewport.pan(0, 1, 604, 1.0);

        assert_eq!(viewport.center_imag(), 120.0);
    }

    #[test]
    fn pan_is_linear_in_elapsed_time_and_pixel_size() {
        let displacement = |pixel_size: f64, elapsed: f64| {
            let mut viewport = ViewportState::new(0.0, 0.0, pixel_size);
            viewport.pan(1, -1, 600, elapsed);
            (viewport.center_real(), viewport.center_imag())
        };

        let (base_real, base_imag) = displacement(0.001, 0.016);
        let (time_real, time_imag) = displacement(0.001, 0.032);
        let (size_real, size_imag) = displacement(0.002, 0.016);

        assert_close(time_real, 2.0 * base_real);
        assert_close(time_imag, 2.0 * base_imag);
        assert_close(size_real, 2.0 * base_real);
        assert_close(size_imag, 2.0 * base_imag);
        assert!(base_imag < 0.0);
    }

    #[test]
    fn diagonal_pan_is_not_normalised() {
        let mut viewport = ViewportState::new(0.0, 0.0, 0.01);

        viewport.pan(1, 0, 600, 0.5);
        viewport.pan(0, 1, 600, 0.5);

        assert_close(viewport.center_real(), 0.6);
        assert_close(viewport.center_imag(), 0.6);
    }

    #[test]
    fn zoom_out_grows_pixel_size() {
        let mut viewport = ViewportState::new(0.0, 0.0, 0.01);

        viewport.zoom(ZoomDirection::Out, 0.1);

        assert_close(viewport.pixel_size(), 0.011);
    }

    #[test]
    fn zoom_in_shrinks_pixel_size() {
        let mut viewport = ViewportState::new(0.0, 0.0, 0.01);

        viewport.zoom(ZoomDirection::In, 0.1);

        assert_close(viewport.pixel_size(), 0.009);
    }

    #[test]
    fn zoom_step_is_capped_at_half_a_second() {
        let mut slow = ViewportState::new(0.0, 0.0, 0.01);
        let mut capped = ViewportState::new(0.0, 0.0, 0.01);

        slow.zoom(ZoomDirection::Out, 3.0);
        capped.zoom(ZoomDirection::Out, 0.5);

        assert_eq!(slow.pixel_size(), capped.pixel_size());
        assert_close(slow.pixel_size(), 0.015);
    }

    #[test]
    fn zoom_in_then_out_is_approximately_invertible() {
        for pixel_size in [1e-3, 4.0 / 600.0, 1e-12, 0.5] {
            for elapsed in [0.001, 0.016, 0.1] {
                let mut viewport = ViewportState::new(0.0, 0.0, pixel_size);

                viewport.zoom(ZoomDirection::In, elapsed);
                viewport.zoom(ZoomDirection::Out, elapsed);

                let relative_error = (viewport.pixel_size() - pixel_size).abs() / pixel_size;
                assert!(relative_error <= elapsed * elapsed + 1e-12);
            }
        }
    }

    #[test]
    fn pixel_size_never_reaches_zero() {
        let mut viewport = ViewportState::new(0.0, 0.0, 1e-300);

        for _ in 0..10_000 {
            viewport.zoom(ZoomDirection::In, 0.5);
        }

        assert!(viewport.pixel_size() > 0.0);
        assert_eq!(viewport.pixel_size(), MIN_PIXEL_SIZE);
    }

    #[test]
    fn large_pixel_sizes_are_kept() {
        let mut viewport = ViewportState::new(0.0, 0.0, 2.0);
        assert_eq!(viewport.pixel_size(), 2.0);

        viewport.zoom(ZoomDirection::In, 0.1);
        viewport.zoom(ZoomDirection::Out, 0.1);
        assert_close(viewport.pixel_size(), 2.0 * (1.0 - 0.1 * 0.1));

        let fitted = ViewportState::fit_height(0.0, 0.0, 1000.0, 600);
        assert_close(fitted.pixel_size(), 1000.0 / 600.0);
    }

    #[test]
    fn infinite_pixel_size_is_clamped() {
        assert_eq!(
            ViewportState::new(0.0, 0.0, f64::INFINITY).pixel_size(),
            MAX_PIXEL_SIZE
        );
    }

    #[test]
    fn degenerate_initial_pixel_size_is_clamped() {
        assert_eq!(ViewportState::new(0.0, 0.0, 0.0).pixel_size(), MIN_PIXEL_SIZE);
        assert_eq!(ViewportState::new(0.0, 0.0, -1.0).pixel_size(), MIN_PIXEL_SIZE);
        assert_eq!(ViewportState::new(0.0, 0.0, f64::NAN).pixel_size(), MIN_PIXEL_SIZE);
    }

    #[test]
    fn recenter_on_screen_center_is_a_no_op() {
        let mut viewport = ViewportState::new(-0.75, 0.1, 0.003);

        viewport.recenter_on(400.0, 300.0, 800, 600);

        assert_eq!(viewport.center_real(), -0.75);
        assert_eq!(viewport.center_imag(), 0.1);
    }

    #[test]
    fn recenter_on_moves_by_the_pixel_offset() {
        let mut viewport = ViewportState::new(0.0, 0.0, 0.01);

        viewport.recenter_on(500.0, 250.0, 800, 600);

        assert_close(viewport.center_real(), 1.0);
        assert_close(viewport.center_imag(), -0.5);
    }

    #[test]
    fn deep_zoom_keeps_sub_pixel_precision() {
        let mut viewport = ViewportState::new(-0.743643887037151, 0.131825904205330, 1e-14);

        viewport.recenter_on(401.0, 300.0, 800, 600);

        assert!(viewport.center_real() > -0.743643887037151);
        assert_close(viewport.center_real(), -0.743643887037141);
    }

    #[test]
    fn reset_restores_the_initial_view() {
        let initial = ViewportState::new(-0.5, 0.0, 0.005);
        let mut viewport = initial;

        viewport.pan(1, 1, 600, 1.0);
        viewport.zoom(ZoomDirection::In, 0.3);
        viewport.reset(initial);

        assert_eq!(viewport, initial);
    }
}
