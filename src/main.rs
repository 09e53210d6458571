use std::time::Instant;

use anyhow::Context;
use log::{debug, error, info};
use winit::{
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use mandelbrot_viewer::{
    config::Config,
    input::{InputState, SettingsCommand, Tick},
    renderer::Renderer,
    screen,
    session::Session,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env().context("invalid configuration")?;
    info!("{:?}", config);

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Mandelbrot")
        .build(&event_loop)
        .context("failed to create window")?;

    let mut renderer = Renderer::new(&window, config.backend, config.threads)
        .context("failed to initialise renderer")?;
    let mut session = Session::new(&config, renderer.surface_size());
    let mut input = InputState::new();
    let mut last_tick = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        // To present frames in realtime, *don't* set `control_flow` to `Wait`.
        match event {
            Event::MainEventsCleared => {
                let now = Instant::now();
                let elapsed_seconds = now.duration_since(last_tick).as_secs_f64();
                last_tick = now;

                session.tick(
                    &mut input,
                    Tick {
                        elapsed_seconds,
                        screen: renderer.surface_size(),
                        render: renderer.render_size(),
                    },
                );

                window.request_redraw();
            }
            Event::WindowEvent {
                window_id,
                ref event,
            } if window_id == window.id() => {
                input.handle_window_event(event);

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }
                    WindowEvent::Resized(size) => {
                        renderer.resize(screen::Size::from(*size));
                        session.mark_dirty();
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(screen::Size::from(**new_inner_size));
                        session.mark_dirty();
                    }
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(key),
                                ..
                            },
                        ..
                    } => {
                        if *key == VirtualKeyCode::Escape {
                            *control_flow = ControlFlow::Exit;
                        } else if let Some(command) = SettingsCommand::from_key(*key) {
                            debug!("{:?}", command);
                            session.apply(command);
                        }
                    }
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if window_id == window.id() => {
                // Minimised: nothing to show, and the view stays dirty until
                // the window comes back.
                if renderer.surface_size().is_empty() {
                    return;
                }

                session.frame(renderer.render_size(), &mut renderer);

                match renderer.present() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        debug!("surface lost, reconfiguring");
                        renderer.reconfigure();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        debug!("surface timed out, skipping frame");
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("out of memory while presenting, skipping frame");
                    }
                }
            }
            _ => {}
        }
    })
}
