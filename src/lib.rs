pub mod buffer;
pub mod colour;
pub mod compute;
pub mod config;
pub mod cpu;
pub mod escape;
pub mod input;
pub mod present;
pub mod render;
pub mod renderer;
pub mod scheduler;
pub mod screen;
pub mod session;
pub mod viewport;
