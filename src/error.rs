use std::path::PathBuf;

use thiserror::Error;

/// Everything that can fail while bringing a [`crate::session::Session`] up.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("the native debugger ({0}) was not found on PATH")]
    DebuggerNotFound(String),

    #[error("could not determine the executable path of pid {0}")]
    UnknownExecutable(u32),

    #[error("session directory {0:?} already exists")]
    SessionDirExists(PathBuf),

    #[error("failed to spawn the native debugger: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("timed out after {0:?} waiting for the session socket to appear")]
    SocketTimeout(std::time::Duration),

    #[error(transparent)]
    Rpc(#[from] inject_rpc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures surfaced while a session is already up and running: template
/// rendering, the interactive bridge, and remote-side evaluation failures
/// that traversal could not route around.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session is currently attached to pid {0}")]
    NotAttached(u32),

    #[error("template {0:?} failed to render: {1}")]
    Template(&'static str, #[source] minijinja::Error),

    #[error(transparent)]
    Rpc(#[from] inject_rpc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The CLI-facing aggregate error. Every operator-visible failure funnels
/// through here so `main` has exactly one place to format a message and
/// pick an exit code.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Attach(#[from] AttachError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Rpc(#[from] inject_rpc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("refusing to inject: {0}")]
    Rejected(String),
}
