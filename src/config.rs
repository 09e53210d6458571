//! Startup configuration.
//!
//! Every setting has a default and can be overridden through a
//! `MANDELBROT_*` environment variable:
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `MANDELBROT_BACKEND` | `gpu`, `cpu` | `gpu` |
//! | `MANDELBROT_ITERATIONS_PER_GROUP` | `1..=256` | `256` |
//! | `MANDELBROT_NUM_GROUPS` | `1..=10` | `1` |
//! | `MANDELBROT_GRADIENT` | `classic`, `fire`, `ice`, `greyscale` | `classic` |
//! | `MANDELBROT_THREADS` | CPU worker threads, at least 1 | logical CPU count |
//! | `MANDELBROT_CENTER_REAL` | float | `0` |
//! | `MANDELBROT_CENTER_IMAG` | float | `0` |
//! | `MANDELBROT_VIEW_HEIGHT` | plane units shown vertically, positive | `4` |

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use thiserror::Error;

use crate::{
    colour::{Gradient, PRESET_NAMES},
    render::Banding,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// `compute.wgsl`, evaluated in `f32`.
    Gpu,
    /// `rayon` thread pool, evaluated in `f64`.
    Cpu,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "gpu" => Ok(Backend::Gpu),
            "cpu" => Ok(Backend::Cpu),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{variable}={value:?} is not valid: expected {expected}")]
    Invalid {
        variable: &'static str,
        value: String,
        expected: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub backend: Backend,
    pub banding: Banding,
    pub gradient: String,
    pub threads: usize,
    pub center_real: f64,
    pub center_imag: f64,
    pub view_height: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Gpu,
            banding: Banding::default(),
            gradient: String::from("classic"),
            threads: num_cpus::get(),
            center_real: 0.0,
            center_imag: 0.0,
            view_height: 4.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Builds a config from `lookup`, which maps a variable name to its value
    /// if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup("MANDELBROT_BACKEND") {
            config.backend = value
                .parse()
                .map_err(|()| invalid("MANDELBROT_BACKEND", &value, "gpu or cpu"))?;
        }
        if let Some(value) = lookup("MANDELBROT_ITERATIONS_PER_GROUP") {
            config.banding.iterations_per_group = parse_in_range(
                "MANDELBROT_ITERATIONS_PER_GROUP",
                &value,
                1..=Banding::MAX_ITERATIONS_PER_GROUP,
            )?;
        }
        if let Some(value) = lookup("MANDELBROT_NUM_GROUPS") {
            config.banding.num_groups =
                parse_in_range("MANDELBROT_NUM_GROUPS", &value, 1..=Banding::MAX_GROUPS)?;
        }
        if let Some(value) = lookup("MANDELBROT_GRADIENT") {
            if Gradient::preset(&value).is_none() {
                return Err(invalid(
                    "MANDELBROT_GRADIENT",
                    &value,
                    &format!("one of {}", PRESET_NAMES.join(", ")),
                ));
            }
            config.gradient = value;
        }
        if let Some(value) = lookup("MANDELBROT_THREADS") {
            config.threads = match value.trim().parse::<usize>() {
                Ok(threads) if threads >= 1 => threads,
                _ => return Err(invalid("MANDELBROT_THREADS", &value, "a positive integer")),
            };
        }
        if let Some(value) = lookup("MANDELBROT_CENTER_REAL") {
            config.center_real = parse_finite("MANDELBROT_CENTER_REAL", &value)?;
        }
        if let Some(value) = lookup("MANDELBROT_CENTER_IMAG") {
            config.center_imag = parse_finite("MANDELBROT_CENTER_IMAG", &value)?;
        }
        if let Some(value) = lookup("MANDELBROT_VIEW_HEIGHT") {
            config.view_height = parse_finite("MANDELBROT_VIEW_HEIGHT", &value)?;
            if config.view_height <= 0.0 {
                return Err(invalid("MANDELBROT_VIEW_HEIGHT", &value, "a positive number"));
            }
        }

        Ok(config)
    }

    /// The configured gradient preset. Falls back to `classic` for a name set
    /// directly on the struct that is not a preset.
    pub fn gradient(&self) -> Gradient {
        Gradient::preset(&self.gradient).unwrap_or_else(Gradient::classic)
    }
}

fn invalid(variable: &'static str, value: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid {
        variable,
        value: value.to_owned(),
        expected: expected.to_owned(),
    }
}

fn parse_in_range<A>(
    variable: &'static str,
    value: &str,
    range: RangeInclusive<A>,
) -> Result<A, ConfigError>
where
    A: FromStr + PartialOrd + Display,
{
    let expected = || format!("an integer in {}..={}", range.start(), range.end());
    match value.trim().parse::<A>() {
        Ok(parsed) if range.contains(&parsed) => Ok(parsed),
        _ => Err(invalid(variable, value, &expected())),
    }
}

fn parse_finite(variable: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(invalid(variable, value, "a finite number")),
    }
}
