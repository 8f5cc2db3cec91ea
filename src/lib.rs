mod bridge;
mod cli;
mod commands;
mod config;
mod controller;
mod error;
mod proc_utils;
mod session;
mod templates;
mod traverse;

pub use cli::{Command, Opts};
pub use commands::{attach, inspect, run_file, run_script, shell};
pub use config::Config;
pub use controller::Controller;
pub use error::{AttachError, Error, SessionError};
pub use proc_utils::exists as target_exists;
pub use session::Session;
