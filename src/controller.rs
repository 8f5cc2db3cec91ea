//! The process-wide handle that owns the temporary root directory and the
//! PID→Session registry.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::config::Config;
use crate::error::AttachError;
use crate::proc_utils;
use crate::session::Session;

pub struct Controller {
    root_dir: TempDir,
    sessions: Arc<Mutex<HashMap<u32, Arc<Session>>>>,
    config: Config,
}

impl Controller {
    pub fn new(config: Config) -> std::io::Result<Controller> {
        let root_dir = tempfile::Builder::new().prefix("injectd_").tempdir()?;
        Ok(Controller { root_dir, sessions: Arc::new(Mutex::new(HashMap::new())), config })
    }

    /// Attaches to `pid`, guessing the executable and context directory
    /// through [`proc_utils`] when not supplied. Returns the existing session
    /// if one is already up for this PID rather than spawning a second
    /// debugger.
    pub fn attach(
        &self,
        pid: u32,
        executable: Option<PathBuf>,
        context_dir: Option<PathBuf>,
    ) -> Result<Arc<Session>, AttachError> {
        if let Some(existing) = self.sessions.lock().expect("sessions mutex poisoned").get(&pid) {
            return Ok(existing.clone());
        }

        let executable = match executable {
            Some(e) => e,
            None => proc_utils::guess_executable(pid).ok_or(AttachError::UnknownExecutable(pid))?,
        };
        let context_dir = match context_dir {
            Some(c) => c,
            None => proc_utils::guess_context_dir(pid)
                .unwrap_or(std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))),
        };

        let sessions = self.sessions.clone();
        let on_teardown = move |pid: u32| {
            sessions.lock().expect("sessions mutex poisoned").remove(&pid);
        };

        let session = Session::attach(
            self.root_dir.path(),
            pid,
            executable,
            context_dir,
            self.config.clone(),
            on_teardown,
        )?;

        self.sessions.lock().expect("sessions mutex poisoned").insert(pid, session.clone());
        Ok(session)
    }

    /// Terminates and forgets the session for `pid`. A no-op if no session
    /// is tracked for it. Double-remove is a no-op.
    pub fn remove(&self, pid: u32) {
        let session = self.sessions.lock().expect("sessions mutex poisoned").get(&pid).cloned();
        if let Some(session) = session {
            session.terminate(true);
        }
        self.sessions.lock().expect("sessions mutex poisoned").remove(&pid);
    }

    pub fn get(&self, pid: u32) -> Option<Arc<Session>> {
        self.sessions.lock().expect("sessions mutex poisoned").get(&pid).cloned()
    }
}

impl Drop for Controller {
    /// Tears down every live session before the `TempDir` guard removes
    /// the root directory.
    fn drop(&mut self) {
        let pids: Vec<u32> =
            self.sessions.lock().expect("sessions mutex poisoned").keys().copied().collect();
        for pid in pids {
            self.remove(pid);
        }
    }
}
