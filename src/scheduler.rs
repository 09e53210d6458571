//! Decides once per frame whether the image has to be recomputed.

use log::{debug, trace, warn};
use thiserror::Error;

use crate::{
    colour::GradientTable,
    render::{self, Banding, ConfigurationError, RenderRequest},
    screen,
    viewport::ViewportState,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("render target is {target:?} but the request is {request:?}")]
    TargetSize {
        target: screen::Size,
        request: screen::Size,
    },
    #[error("device error during dispatch: {0}")]
    Device(#[from] wgpu::Error),
}

/// Something that evaluates a [`RenderRequest`] into the render target.
///
/// When `dispatch` returns `Ok`, the next presentation must show the
/// completed result for `request`.
pub trait Dispatch {
    fn dispatch(&mut self, request: &RenderRequest) -> Result<(), DispatchError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// The render target matches the current view.
    Clean,
    /// The render target is stale.
    Dirty,
}

#[derive(Debug)]
pub enum FrameOutcome {
    Rendered,
    Skipped,
    Rejected(ConfigurationError),
    Failed(DispatchError),
}

pub struct FrameScheduler {
    state: FrameState,
    last_rejection: Option<ConfigurationError>,
}

impl FrameScheduler {
    /// Starts dirty so the first frame always renders.
    pub fn new() -> Self {
        Self {
            state: FrameState::Dirty,
            last_rejection: None,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == FrameState::Dirty
    }

    pub fn mark_dirty(&mut self) {
        if self.state == FrameState::Clean {
            trace!("frame state Clean -> Dirty");
        }
        self.state = FrameState::Dirty;
    }

    /// Renders if dirty. Only a successful dispatch makes the state clean;
    /// rejected and failed frames are retried on the next call.
    pub fn frame<D: Dispatch + ?Sized>(
        &mut self,
        viewport: &ViewportState,
        size: screen::Size,
        gradient_table: &GradientTable,
        banding: Banding,
        dispatcher: &mut D,
    ) -> FrameOutcome {
        if self.state == FrameState::Clean {
            return FrameOutcome::Skipped;
        }

        let request = match render::build(viewport, size, gradient_table, banding) {
            Ok(request) => request,
            Err(error) => {
                if self.last_rejection.as_ref() != Some(&error) {
                    warn!("render request rejected: {}", error);
                    self.last_rejection = Some(error.clone());
                }
                return FrameOutcome::Rejected(error);
            }
        };
        self.last_rejection = None;

        match dispatcher.dispatch(&request) {
            Ok(()) => {
                debug!(
                    "rendered {}x{} at ({}, {}) pixel size {:e}",
                    size.width,
                    size.height,
                    viewport.center_real(),
                    viewport.center_imag(),
                    viewport.pixel_size()
                );
                self.state = FrameState::Clean;
                FrameOutcome::Rendered
            }
            Err(error) => {
                warn!("dispatch failed, retrying next frame: {}", error);
                FrameOutcome::Failed(error)
            }
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}
