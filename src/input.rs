//! Polled keyboard and mouse state, and its translation into view changes.
//!
//! Window events only update [`InputState`]. Once per tick the
//! [`InputController`] looks at what is held down and moves the viewport,
//! scaled by the time since the previous tick.

use fnv::FnvHashSet;
use winit::event::{
    ElementState, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode, WindowEvent,
};

use crate::{
    screen,
    viewport::{ViewportState, ZoomDirection},
};

/// Seconds of zoom applied per mouse wheel line.
pub const WHEEL_LINE_SECONDS: f64 = 0.1;

/// Pixels of touchpad scrolling treated as one wheel line.
const PIXELS_PER_WHEEL_LINE: f64 = 40.0;

const PAN_KEYS: [(VirtualKeyCode, i8, i8); 4] = [
    (VirtualKeyCode::Left, -1, 0),
    (VirtualKeyCode::Right, 1, 0),
    (VirtualKeyCode::Up, 0, 1),
    (VirtualKeyCode::Down, 0, -1),
];

const ZOOM_KEYS: [(VirtualKeyCode, ZoomDirection); 4] = [
    (VirtualKeyCode::NumpadAdd, ZoomDirection::In),
    (VirtualKeyCode::Equals, ZoomDirection::In),
    (VirtualKeyCode::NumpadSubtract, ZoomDirection::Out),
    (VirtualKeyCode::Minus, ZoomDirection::Out),
];

/// Side mouse buttons. Platforms number them differently: X11 reports 8 and
/// 9, Windows and macOS report 1 and 2 (beyond left/right/middle).
fn side_button_zoom(button: MouseButton) -> Option<ZoomDirection> {
    match button {
        MouseButton::Other(1) | MouseButton::Other(8) => Some(ZoomDirection::Out),
        MouseButton::Other(2) | MouseButton::Other(9) => Some(ZoomDirection::In),
        _ => None,
    }
}

/// Time since the previous tick, the current window size, and the size of
/// the rendered image stretched over it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub elapsed_seconds: f64,
    pub screen: screen::Size,
    pub render: screen::Size,
}

/// What the input devices look like right now.
#[derive(Debug, Default)]
pub struct InputState {
    held_keys: FnvHashSet<VirtualKeyCode>,
    held_buttons: FnvHashSet<MouseButton>,
    /// Top-left origin, as reported by the window system.
    cursor: (f64, f64),
    click: Option<(f64, f64)>,
    wheel_lines: f64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.press_key(*key),
                ElementState::Released => self.release_key(*key),
            },
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.press_button(*button),
                ElementState::Released => self.release_button(*button),
            },
            WindowEvent::CursorMoved { position, .. } => self.move_cursor(position.x, position.y),
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, lines) => self.scroll(*lines as f64),
                MouseScrollDelta::PixelDelta(position) => {
                    self.scroll(position.y / PIXELS_PER_WHEEL_LINE)
                }
            },
            WindowEvent::Focused(false) => self.release_all(),
            _ => {}
        }
    }

    pub fn press_key(&mut self, key: VirtualKeyCode) {
        self.held_keys.insert(key);
    }

    pub fn release_key(&mut self, key: VirtualKeyCode) {
        self.held_keys.remove(&key);
    }

    pub fn is_key_held(&self, key: VirtualKeyCode) -> bool {
        self.held_keys.contains(&key)
    }

    /// A left press also records a click at the current cursor position.
    /// Key repeat does not apply to mouse buttons, so each physical press
    /// clicks exactly once.
    pub fn press_button(&mut self, button: MouseButton) {
        if button == MouseButton::Left && !self.held_buttons.contains(&button) {
            self.click = Some(self.cursor);
        }
        self.held_buttons.insert(button);
    }

    pub fn release_button(&mut self, button: MouseButton) {
        self.held_buttons.remove(&button);
    }

    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.held_buttons.contains(&button)
    }

    pub fn move_cursor(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    /// Positive lines scroll up, which zooms in.
    pub fn scroll(&mut self, lines: f64) {
        self.wheel_lines += lines;
    }

    /// Drops everything held, e.g. when the window loses focus and will not
    /// see the matching release events.
    pub fn release_all(&mut self) {
        self.held_keys.clear();
        self.held_buttons.clear();
    }

    fn take_click(&mut self) -> Option<(f64, f64)> {
        self.click.take()
    }

    fn take_wheel_lines(&mut self) -> f64 {
        std::mem::take(&mut self.wheel_lines)
    }
}

/// Turns held input into [`ViewportState`] changes.
///
/// Every active source applies its own change, so two pan keys at right
/// angles move diagonally at `sqrt(2)` times the axis speed, and two zoom
/// sources in the same direction zoom twice as fast.
#[derive(Debug, Default)]
pub struct InputController;

impl InputController {
    pub fn new() -> Self {
        Self
    }

    /// Applies one tick of input. Returns whether the viewport changed.
    pub fn poll(&self, input: &mut InputState, tick: Tick, viewport: &mut ViewportState) -> bool {
        let mut changed = false;
        let elapsed = tick.elapsed_seconds;

        for (key, direction_x, direction_y) in PAN_KEYS {
            if input.is_key_held(key) {
                viewport.pan(direction_x, direction_y, tick.screen.height, elapsed);
                changed = true;
            }
        }

        for (key, direction) in ZOOM_KEYS {
            if input.is_key_held(key) {
                viewport.zoom(direction, elapsed);
                changed = true;
            }
        }

        for button in input.held_buttons.iter().copied() {
            if let Some(direction) = side_button_zoom(button) {
                viewport.zoom(direction, elapsed);
                changed = true;
            }
        }

        let wheel_lines = input.take_wheel_lines();
        if wheel_lines != 0.0 {
            let direction = if wheel_lines > 0.0 {
                ZoomDirection::In
            } else {
                ZoomDirection::Out
            };
            viewport.zoom(direction, wheel_lines.abs() * WHEEL_LINE_SECONDS);
            changed = true;
        }

        // Clicks arrive in window pixels; the view is measured in render
        // pixels.
        if let Some((x, y)) = input.take_click() {
            if !tick.screen.is_empty() {
                let scale_x = tick.render.width as f64 / tick.screen.width as f64;
                let scale_y = tick.render.height as f64 / tick.screen.height as f64;
                let from_bottom = tick.screen.height as f64 - y;
                viewport.recenter_on(
                    x * scale_x,
                    from_bottom * scale_y,
                    tick.render.width,
                    tick.render.height,
                );
                changed = true;
            }
        }

        changed
    }
}

/// Live edits to the colouring and view, outside the per-tick controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsCommand {
    MoreIterationsPerGroup,
    FewerIterationsPerGroup,
    MoreGroups,
    FewerGroups,
    NextGradient,
    ResetView,
}

impl SettingsCommand {
    pub fn from_key(key: VirtualKeyCode) -> Option<Self> {
        match key {
            VirtualKeyCode::RBracket => Some(Self::MoreIterationsPerGroup),
            VirtualKeyCode::LBracket => Some(Self::FewerIterationsPerGroup),
            VirtualKeyCode::PageUp => Some(Self::MoreGroups),
            VirtualKeyCode::PageDown => Some(Self::FewerGroups),
            VirtualKeyCode::Tab => Some(Self::NextGradient),
            VirtualKeyCode::Home => Some(Self::ResetView),
            _ => None,
        }
    }
}
