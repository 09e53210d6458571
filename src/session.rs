//! One viewing session: the view, the colouring, and when to redraw.

use log::{debug, info};

use crate::{
    colour::{Gradient, GradientTable, PRESET_NAMES},
    config::Config,
    input::{InputController, InputState, SettingsCommand, Tick},
    render::Banding,
    scheduler::{Dispatch, FrameOutcome, FrameScheduler},
    screen,
    viewport::ViewportState,
};

/// The gradient, the banding, and the lookup table derived from both.
pub struct Colouring {
    gradient: Gradient,
    banding: Banding,
    table: GradientTable,
}

impl Colouring {
    pub fn new(gradient: Gradient, banding: Banding) -> Self {
        let table = GradientTable::build(&gradient, banding.iterations_per_group);
        Self {
            gradient,
            banding,
            table,
        }
    }

    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    pub fn banding(&self) -> Banding {
        self.banding
    }

    pub fn table(&self) -> &GradientTable {
        &self.table
    }

    fn set_gradient(&mut self, gradient: Gradient) {
        self.table = GradientTable::build(&gradient, self.banding.iterations_per_group);
        self.gradient = gradient;
    }

    fn set_banding(&mut self, banding: Banding) {
        if banding.iterations_per_group != self.banding.iterations_per_group {
            self.table = GradientTable::build(&self.gradient, banding.iterations_per_group);
        }
        self.banding = banding;
    }
}

pub struct Session {
    initial_view: ViewportState,
    viewport: ViewportState,
    colouring: Colouring,
    gradient_preset: usize,
    controller: InputController,
    scheduler: FrameScheduler,
}

impl Session {
    pub fn new(config: &Config, screen: screen::Size) -> Self {
        let initial_view = ViewportState::fit_height(
            config.center_real,
            config.center_imag,
            config.view_height,
            screen.height,
        );
        let gradient_preset = PRESET_NAMES
            .iter()
            .position(|name| *name == config.gradient)
            .unwrap_or(0);

        Self {
            initial_view,
            viewport: initial_view,
            colouring: Colouring::new(config.gradient(), config.banding),
            gradient_preset,
            controller: InputController::new(),
            scheduler: FrameScheduler::new(),
        }
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn colouring(&self) -> &Colouring {
        &self.colouring
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn mark_dirty(&mut self) {
        self.scheduler.mark_dirty();
    }

    /// Applies one tick of held input to the view.
    pub fn tick(&mut self, input: &mut InputState, tick: Tick) {
        if self.controller.poll(input, tick, &mut self.viewport) {
            self.scheduler.mark_dirty();
        }
    }

    /// Renders into `dispatcher` if anything changed since the last
    /// successful render.
    pub fn frame<D: Dispatch + ?Sized>(
        &mut self,
        size: screen::Size,
        dispatcher: &mut D,
    ) -> FrameOutcome {
        self.scheduler.frame(
            &self.viewport,
            size,
            self.colouring.table(),
            self.colouring.banding(),
            dispatcher,
        )
    }

    pub fn set_gradient(&mut self, gradient: Gradient) {
        self.colouring.set_gradient(gradient);
        self.scheduler.mark_dirty();
    }

    /// Clamps both counts into `1..=MAX_ITERATIONS_PER_GROUP` and
    /// `1..=MAX_GROUPS`.
    pub fn set_banding(&mut self, banding: Banding) {
        let banding = banding.clamped();
        debug!(
            "banding set to {} iterations x {} groups",
            banding.iterations_per_group, banding.num_groups
        );
        self.colouring.set_banding(banding);
        self.scheduler.mark_dirty();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset(self.initial_view);
        self.scheduler.mark_dirty();
    }

    pub fn apply(&mut self, command: SettingsCommand) {
        let banding = self.colouring.banding();

        match command {
            SettingsCommand::MoreIterationsPerGroup => self.set_banding(Banding {
                iterations_per_group: banding.iterations_per_group.saturating_mul(2),
                ..banding
            }),
            SettingsCommand::FewerIterationsPerGroup => self.set_banding(Banding {
                iterations_per_group: banding.iterations_per_group / 2,
                ..banding
            }),
            SettingsCommand::MoreGroups => self.set_banding(Banding {
                num_groups: banding.num_groups.saturating_add(1),
                ..banding
            }),
            SettingsCommand::FewerGroups => self.set_banding(Banding {
                num_groups: banding.num_groups.saturating_sub(1),
                ..banding
            }),
            SettingsCommand::NextGradient => {
                self.gradient_preset = (self.gradient_preset + 1) % PRESET_NAMES.len();
                let name = PRESET_NAMES[self.gradient_preset];
                info!("gradient: {}", name);
                if let Some(gradient) = Gradient::preset(name) {
                    self.set_gradient(gradient);
                }
            }
            SettingsCommand::ResetView => self.reset_view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colour::{Colour, GradientStop},
        config::Backend,
        scheduler::tests::RecordingDispatcher,
    };
    use winit::event::VirtualKeyCode;

    const SCREEN: screen::Size = screen::Size::new(800, 600);

    fn config() -> Config {
        Config {
            backend: Backend::Cpu,
            banding: Banding {
                iterations_per_group: 64,
                num_groups: 2,
            },
            gradient: String::from("classic"),
            threads: 1,
            center_real: 0.0,
            center_imag: 0.0,
            view_height: 4.0,
        }
    }

    fn rendered_session() -> (Session, RecordingDispatcher) {
        let mut session = Session::new(&config(), SCREEN);
        let mut dispatcher = RecordingDispatcher::default();
        session.frame(SCREEN, &mut dispatcher);
        assert!(!session.is_dirty());
        (session, dispatcher)
    }

    #[test]
    fn initial_view_fits_the_set_vertically() {
        let session = Session::new(&config(), SCREEN);

        assert_eq!(session.viewport().pixel_size(), 4.0 / 600.0);
        assert_eq!(session.viewport().center_real(), 0.0);
        assert!(session.is_dirty());
    }

    #[test]
    fn panning_for_a_second_moves_and_marks_dirty() {
        let (mut session, _) = rendered_session();
        let mut input = InputState::new();
        input.press_key(VirtualKeyCode::Right);

        session.tick(
            &mut input,
            Tick {
                elapsed_seconds: 1.0,
                screen: SCREEN,
                render: SCREEN,
            },
        );

        assert!((session.viewport().center_real() - 0.8).abs() < 1e-12);
        assert_eq!(session.viewport().center_imag(), 0.0);
        assert!(session.is_dirty());
    }

    #[test]
    fn idle_ticks_leave_the_frame_clean() {
        let (mut session, mut dispatcher) = rendered_session();
        let mut input = InputState::new();

        for _ in 0..10 {
            session.tick(
                &mut input,
                Tick {
                    elapsed_seconds: 0.016,
                    screen: SCREEN,
                    render: SCREEN,
                },
            );
            assert!(matches!(
                session.frame(SCREEN, &mut dispatcher),
                FrameOutcome::Skipped
            ));
        }

        assert_eq!(dispatcher.requests.len(), 1);
    }

    #[test]
    fn gradient_edits_rebuild_the_table_and_mark_dirty() {
        let (mut session, _) = rendered_session();
        let gradient = Gradient::new(vec![GradientStop::new(0.0, Colour::WHITE)]).unwrap();

        session.set_gradient(gradient);

        assert!(session.is_dirty());
        assert_eq!(session.colouring().table().len(), 64);
        assert!(session
            .colouring()
            .table()
            .as_slice()
            .iter()
            .all(|colour| *colour == Colour::WHITE));
    }

    #[test]
    fn iteration_changes_resize_the_table() {
        let (mut session, _) = rendered_session();

        session.apply(SettingsCommand::MoreIterationsPerGroup);

        assert!(session.is_dirty());
        assert_eq!(session.colouring().banding().iterations_per_group, 128);
        assert_eq!(session.colouring().table().len(), 128);

        session.apply(SettingsCommand::MoreIterationsPerGroup);
        session.apply(SettingsCommand::MoreIterationsPerGroup);

        assert_eq!(session.colouring().banding().iterations_per_group, 256);
    }

    #[test]
    fn banding_commands_are_clamped() {
        let mut session = Session::new(&config(), SCREEN);

        for _ in 0..20 {
            session.apply(SettingsCommand::FewerIterationsPerGroup);
            session.apply(SettingsCommand::FewerGroups);
        }
        assert_eq!(
            session.colouring().banding(),
            Banding {
                iterations_per_group: 1,
                num_groups: 1
            }
        );

        for _ in 0..20 {
            session.apply(SettingsCommand::MoreGroups);
        }
        assert_eq!(session.colouring().banding().num_groups, Banding::MAX_GROUPS);
    }

    #[test]
    fn next_gradient_cycles_presets() {
        let mut session = Session::new(&config(), SCREEN);

        session.apply(SettingsCommand::NextGradient);
        assert_eq!(session.colouring().gradient(), &Gradient::fire());

        for _ in 1..PRESET_NAMES.len() {
            session.apply(SettingsCommand::NextGradient);
        }
        assert_eq!(session.colouring().gradient(), &Gradient::classic());
    }

    #[test]
    fn set_banding_clamps_out_of_range_counts() {
        let (mut session, mut dispatcher) = rendered_session();

        session.set_banding(Banding {
            iterations_per_group: 3_000_000_000,
            num_groups: u32::MAX,
        });

        assert_eq!(
            session.colouring().banding(),
            Banding {
                iterations_per_group: Banding::MAX_ITERATIONS_PER_GROUP,
                num_groups: Banding::MAX_GROUPS
            }
        );
        assert_eq!(session.colouring().table().len(), 256);
        assert!(session.is_dirty());

        session.set_banding(Banding {
            iterations_per_group: 0,
            num_groups: 0,
        });

        assert_eq!(
            session.colouring().banding(),
            Banding {
                iterations_per_group: 1,
                num_groups: 1
            }
        );
        assert!(matches!(
            session.frame(SCREEN, &mut dispatcher),
            FrameOutcome::Rendered
        ));
        assert_eq!(dispatcher.requests.len(), 2);
    }

    #[test]
    fn reset_view_restores_the_start() {
        let (mut session, _) = rendered_session();
        let mut input = InputState::new();
        input.press_key(VirtualKeyCode::NumpadAdd);
        input.press_key(VirtualKeyCode::Up);
        session.tick(
            &mut input,
            Tick {
                elapsed_seconds: 0.25,
                screen: SCREEN,
                render: SCREEN,
            },
        );
        session.frame(SCREEN, &mut RecordingDispatcher::default());

        session.apply(SettingsCommand::ResetView);

        assert!(session.is_dirty());
        assert_eq!(session.viewport(), &ViewportState::new(0.0, 0.0, 4.0 / 600.0));
    }
}
