//! Ratatui front end. `App` holds the state and executes `Command`s, the
//! submodules split forms, screens, drawing and the terminal loop.

mod app;
mod commands;
mod draw;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use commands::{Command, PathChoice, PendingFileOp};
pub use terminal::run_app;
