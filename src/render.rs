//! Per-frame render parameters derived from the viewport.

use thiserror::Error;

use crate::{
    colour::{Colour, GradientTable},
    screen::{self, TILE_SIZE},
    viewport::ViewportState,
};

/// How the escape-time range is split across the gradient table.
///
/// The evaluators run up to `iterations_per_group * num_groups` iterations.
/// A point escaping at iteration `n` sits in band `n / iterations_per_group`
/// and takes `gradient[n % iterations_per_group]`, so a short table covers
/// a long iteration range by repeating once per band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Banding {
    pub iterations_per_group: u32,
    pub num_groups: u32,
}

impl Banding {
    pub const MAX_ITERATIONS_PER_GROUP: u32 = 256;
    pub const MAX_GROUPS: u32 = 10;

    pub fn max_iterations(self) -> u32 {
        self.iterations_per_group.saturating_mul(self.num_groups)
    }

    /// Both counts pulled into `1..=MAX_ITERATIONS_PER_GROUP` and
    /// `1..=MAX_GROUPS`.
    pub fn clamped(self) -> Self {
        Self {
            iterations_per_group: self
                .iterations_per_group
                .clamp(1, Self::MAX_ITERATIONS_PER_GROUP),
            num_groups: self.num_groups.clamp(1, Self::MAX_GROUPS),
        }
    }

    pub fn gradient_index(self, escape_iteration: u32) -> usize {
        (escape_iteration % self.iterations_per_group) as usize
    }
}

impl Default for Banding {
    fn default() -> Self {
        Self {
            iterations_per_group: Self::MAX_ITERATIONS_PER_GROUP,
            num_groups: 1,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "render size {width}x{height} is not a non-zero multiple of {} in both dimensions",
        TILE_SIZE
    )]
    UntileableSize { width: u32, height: u32 },
    #[error("iterations per group must be at least 1")]
    NoIterationsPerGroup,
    #[error("number of groups must be at least 1")]
    NoGroups,
    #[error("gradient table has {actual} entries but iterations per group is {expected}")]
    GradientLength { expected: u32, actual: usize },
}

/// Everything an evaluator needs to fill one frame.
///
/// The origin is the plane coordinate of the bottom-left pixel. Raster row 0
/// is the top of the image, so row `r` maps to plane row `height - 1 - r`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRequest<'a> {
    pub size: screen::Size,
    pub origin_real: f64,
    pub origin_imag: f64,
    pub pixel_size: f64,
    pub banding: Banding,
    pub gradient: &'a [Colour],
}

impl<'a> RenderRequest<'a> {
    pub fn plane_coordinate(&self, x: u32, row: u32) -> (f64, f64) {
        let y = self.size.height - 1 - row;
        (
            self.origin_real + x as f64 * self.pixel_size,
            self.origin_imag + y as f64 * self.pixel_size,
        )
    }
}

pub fn build<'a>(
    viewport: &ViewportState,
    size: screen::Size,
    gradient_table: &'a GradientTable,
    banding: Banding,
) -> Result<RenderRequest<'a>, ConfigurationError> {
    if !size.is_tileable() {
        return Err(ConfigurationError::UntileableSize {
            width: size.width,
            height: size.height,
        });
    }
    if banding.iterations_per_group < 1 {
        return Err(ConfigurationError::NoIterationsPerGroup);
    }
    if banding.num_groups < 1 {
        return Err(ConfigurationError::NoGroups);
    }
    if gradient_table.len() != banding.iterations_per_group as usize {
        return Err(ConfigurationError::GradientLength {
            expected: banding.iterations_per_group,
            actual: gradient_table.len(),
        });
    }

    let pixel_size = viewport.pixel_size();
    Ok(RenderRequest {
        size,
        origin_real: viewport.center_real() - (size.width as f64 / 2.0) * pixel_size,
        origin_imag: viewport.center_imag() - (size.height as f64 / 2.0) * pixel_size,
        pixel_size,
        banding,
        gradient: gradient_table.as_slice(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::Gradient;

    fn table(count: u32) -> GradientTable {
        GradientTable::build(&Gradient::greyscale(), count)
    }

    fn banding(iterations_per_group: u32, num_groups: u32) -> Banding {
        Banding {
            iterations_per_group,
            num_groups,
        }
    }

    #[test]
    fn accepts_tileable_size() {
        let viewport = ViewportState::new(0.0, 0.0, 4.0 / 600.0);
        let table = table(256);

        let request = build(&viewport, screen::Size::new(800, 600), &table, Banding::default());

        assert!(request.is_ok());
    }

    #[test]
    fn rejects_untileable_size() {
        let viewport = ViewportState::new(0.0, 0.0, 4.0 / 600.0);
        let table = table(256);

        let request = build(&viewport, screen::Size::new(801, 600), &table, Banding::default());

        assert_eq!(
            request,
            Err(ConfigurationError::UntileableSize {
                width: 801,
                height: 600
            })
        );
    }

    #[test]
    fn rejects_empty_size() {
        let viewport = ViewportState::new(0.0, 0.0, 0.01);
        let table = table(256);

        let request = build(&viewport, screen::Size::new(0, 0), &table, Banding::default());

        assert!(matches!(
            request,
            Err(ConfigurationError::UntileableSize { .. })
        ));
    }

    #[test]
    fn rejects_zero_iterations_or_groups() {
        let viewport = ViewportState::new(0.0, 0.0, 0.01);
        let size = screen::Size::new(64, 64);

        assert_eq!(
            build(&viewport, size, &table(0), banding(0, 1)),
            Err(ConfigurationError::NoIterationsPerGroup)
        );
        assert_eq!(
            build(&viewport, size, &table(16), banding(16, 0)),
            Err(ConfigurationError::NoGroups)
        );
    }

    #[test]
    fn rejects_stale_gradient_table() {
        let viewport = ViewportState::new(0.0, 0.0, 0.01);

        let stale = table(128);

        let request = build(&viewport, screen::Size::new(64, 64), &stale, banding(256, 1));

        assert_eq!(
            request,
            Err(ConfigurationError::GradientLength {
                expected: 256,
                actual: 128
            })
        );
    }

    #[test]
    fn origin_is_the_bottom_left_corner() {
        let viewport = ViewportState::new(-0.5, 0.25, 0.01);
        let table = table(32);

        let request =
            build(&viewport, screen::Size::new(800, 600), &table, banding(32, 3)).unwrap();

        assert!((request.origin_real - (-4.5)).abs() < 1e-12);
        assert!((request.origin_imag - (-2.75)).abs() < 1e-12);
        assert_eq!(request.pixel_size, 0.01);
        assert_eq!(request.banding, banding(32, 3));
        assert_eq!(request.gradient.len(), 32);
    }

    #[test]
    fn plane_coordinates_flip_the_raster_rows() {
        let viewport = ViewportState::new(0.0, 0.0, 1.0);
        let table = table(4);

        let request = build(&viewport, screen::Size::new(8, 8), &table, banding(4, 1)).unwrap();

        assert_eq!(request.plane_coordinate(0, 7), (-4.0, -4.0));
        assert_eq!(request.plane_coordinate(0, 0), (-4.0, 3.0));
        assert_eq!(request.plane_coordinate(4, 3), (0.0, 0.0));
    }

    #[test]
    fn banding_splits_escape_iterations() {
        let banding = banding(16, 4);

        assert_eq!(banding.max_iterations(), 64);
        assert_eq!(banding.gradient_index(0), 0);
        assert_eq!(banding.gradient_index(37), 5);
    }

    #[test]
    fn clamped_banding_stays_in_range() {
        assert_eq!(banding(0, 0).clamped(), banding(1, 1));
        assert_eq!(banding(u32::MAX, 11).clamped(), banding(256, 10));
        assert_eq!(banding(64, 3).clamped(), banding(64, 3));
    }
}
