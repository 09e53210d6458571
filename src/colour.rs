//! Colours, gradients and the cyclic gradient lookup table.

use bytemuck::{Pod, Zeroable};
use log::trace;
use thiserror::Error;

/// [`bytemuck`]-compatible RGBA colour. Uploads as a WGSL `vec4<f32>`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub const BLACK: Self = Colour {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const WHITE: Self = Colour {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Opaque colour from 8-bit channels.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Colour {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let s = 1.0 - t;
        Colour {
            r: self.r * s + other.r * t,
            g: self.g * s + other.g * t,
            b: self.b * s + other.b * t,
            a: self.a * s + other.a * t,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        fn channel(value: f32) -> u8 {
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub position: f32,
    pub colour: Colour,
}

impl GradientStop {
    pub const fn new(position: f32, colour: Colour) -> Self {
        Self { position, colour }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GradientError {
    #[error("a gradient needs at least one stop")]
    NoStops,
    #[error("gradient stop position {0} is outside [0, 1]")]
    PositionOutOfRange(f32),
}

/// An author-supplied colour curve over `[0, 1]`.
///
/// Positions outside the first and last stop take the colour of that stop.
/// Between two stops the colour is blended linearly.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn new(mut stops: Vec<GradientStop>) -> Result<Self, GradientError> {
        if stops.is_empty() {
            return Err(GradientError::NoStops);
        }
        if let Some(stop) = stops
            .iter()
            .find(|stop| !(0.0..=1.0).contains(&stop.position))
        {
            return Err(GradientError::PositionOutOfRange(stop.position));
        }

        // Stable, so stops sharing a position keep their authored order.
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    pub fn evaluate(&self, position: f32) -> Colour {
        let first = self.stops[0];
        if position <= first.position {
            return first.colour;
        }

        for pair in self.stops.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            if position <= right.position {
                let span = right.position - left.position;
                if span <= 0.0 {
                    return right.colour;
                }
                return left.colour.lerp(right.colour, (position - left.position) / span);
            }
        }

        self.stops[self.stops.len() - 1].colour
    }

    /// Dark blue through white and orange, wrapping back to dark blue so the
    /// table cycles without a seam.
    pub fn classic() -> Self {
        Self::from_static(&[
            GradientStop::new(0.0, Colour::rgb8(0, 7, 100)),
            GradientStop::new(0.16, Colour::rgb8(32, 107, 203)),
            GradientStop::new(0.42, Colour::rgb8(237, 255, 255)),
            GradientStop::new(0.6425, Colour::rgb8(255, 170, 0)),
            GradientStop::new(0.8575, Colour::rgb8(0, 2, 0)),
            GradientStop::new(1.0, Colour::rgb8(0, 7, 100)),
        ])
    }

    pub fn fire() -> Self {
        Self::from_static(&[
            GradientStop::new(0.0, Colour::rgb8(0, 0, 0)),
            GradientStop::new(0.3, Colour::rgb8(180, 20, 0)),
            GradientStop::new(0.6, Colour::rgb8(255, 160, 0)),
            GradientStop::new(0.85, Colour::rgb8(255, 255, 200)),
            GradientStop::new(1.0, Colour::rgb8(0, 0, 0)),
        ])
    }

    pub fn ice() -> Self {
        Self::from_static(&[
            GradientStop::new(0.0, Colour::rgb8(8, 16, 48)),
            GradientStop::new(0.5, Colour::rgb8(120, 200, 255)),
            GradientStop::new(1.0, Colour::rgb8(8, 16, 48)),
        ])
    }

    pub fn greyscale() -> Self {
        Self::from_static(&[
            GradientStop::new(0.0, Colour::BLACK),
            GradientStop::new(1.0, Colour::WHITE),
        ])
    }

    /// Looks up one of the built-in gradients by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "fire" => Some(Self::fire()),
            "ice" => Some(Self::ice()),
            "greyscale" => Some(Self::greyscale()),
            _ => None,
        }
    }

    fn from_static(stops: &[GradientStop]) -> Self {
        Self {
            stops: stops.to_vec(),
        }
    }
}

pub const PRESET_NAMES: [&str; 4] = ["classic", "fire", "ice", "greyscale"];

/// Fixed-size lookup table sampled evenly from a [`Gradient`].
///
/// Entry `i` of a table with `n` entries holds the gradient at `i / (n - 1)`,
/// so the first entry is the start of the curve and the last entry its end.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientTable {
    colours: Vec<Colour>,
}

impl GradientTable {
    pub fn build(gradient: &Gradient, count: u32) -> Self {
        trace!("building gradient table with {} entries", count);

        let colours = (0..count)
            .map(|index| gradient.evaluate(sample_position(index, count)))
            .collect();
        Self { colours }
    }

    pub fn as_slice(&self) -> &[Colour] {
        &self.colours
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }
}

fn sample_position(index: u32, count: u32) -> f32 {
    if count <= 1 {
        0.0
    } else {
        index as f32 / (count - 1) as f32
    }
}
