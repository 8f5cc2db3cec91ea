//! Per-target session lifecycle.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use inject_rpc::{create_rpc_client, GdbStub, RpcClient};
use log::{info, warn};

use crate::config::Config;
use crate::error::AttachError;
use crate::templates;

/// One attached target process. Owns the session directory, the spawned
/// native-debugger subprocess (via its supervisor thread), and the RPC
/// client connected to the bootstrapped agent.
///
/// Invariant: while the supervisor thread is alive, the session
/// directory exists and the socket path is either absent or owned by the
/// bootstrap script. At most one supervisor runs per `Session`.
pub struct Session {
    pid: u32,
    executable: PathBuf,
    context_dir: PathBuf,
    session_dir: PathBuf,
    socket_path: PathBuf,
    terminate_requested: Arc<AtomicBool>,
    available: Arc<(Mutex<bool>, Condvar)>,
    state: Mutex<State>,
}

struct State {
    client: Option<Arc<RpcClient>>,
    gdb: Option<GdbStub>,
    supervisor: Option<JoinHandle<()>>,
}

impl Session {
    /// Materializes the session directory and bootstrap script, spawns the
    /// native debugger under a supervisor thread, and blocks until either
    /// the RPC client is connected or `config.socket_wait` elapses.
    ///
    /// `on_teardown` is invoked exactly once, from the supervisor thread,
    /// after the session directory has been removed — the registry uses it
    /// to drop its own reference without the supervisor needing to know
    /// about the registry's map type.
    pub fn attach(
        root_dir: &Path,
        pid: u32,
        executable: PathBuf,
        context_dir: PathBuf,
        config: Config,
        on_teardown: impl FnOnce(u32) + Send + 'static,
    ) -> Result<Arc<Session>, AttachError> {
        let gdb_path = which::which(&config.gdb_bin)
            .map_err(|_| AttachError::DebuggerNotFound(config.gdb_bin.clone()))?;

        let session_dir = root_dir.join("sessions").join(pid.to_string());
        if session_dir.exists() {
            return Err(AttachError::SessionDirExists(session_dir));
        }
        fs::create_dir_all(&session_dir)?;

        let bootstrap_path = session_dir.join("run.py");
        let bootstrap_source = templates::render_bootstrap().map_err(|e| match e {
            crate::error::SessionError::Io(e) => AttachError::Io(e),
            other => AttachError::Io(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
        })?;
        fs::write(&bootstrap_path, bootstrap_source)?;

        let socket_path = session_dir.join("session.sock");

        let session = Arc::new(Session {
            pid,
            executable: executable.clone(),
            context_dir: context_dir.clone(),
            session_dir: session_dir.clone(),
            socket_path: socket_path.clone(),
            terminate_requested: Arc::new(AtomicBool::new(false)),
            available: Arc::new((Mutex::new(false), Condvar::new())),
            state: Mutex::new(State { client: None, gdb: None, supervisor: None }),
        });

        let child = spawn_debugger(&gdb_path, pid, &executable, &context_dir, &bootstrap_path)?;
        let socket_wait = config.socket_wait;

        let supervisor = {
            let session = session.clone();
            let supervisor_config = config.clone();
            std::thread::spawn(move || session.supervise(child, supervisor_config, on_teardown))
        };
        session.state.lock().expect("state mutex poisoned").supervisor = Some(supervisor);

        let (lock, cvar) = &*session.available;
        let guard = lock.lock().expect("available mutex poisoned");
        let (guard, timed_out) = cvar
            .wait_timeout_while(guard, socket_wait, |available| !*available)
            .expect("available mutex poisoned");
        drop(guard);

        if timed_out.timed_out() {
            session.terminate_requested.store(true, Ordering::SeqCst);
            return Err(AttachError::SocketTimeout(socket_wait));
        }

        let connected = session.state.lock().expect("state mutex poisoned").client.is_some();
        if !connected {
            return Err(AttachError::SocketTimeout(socket_wait));
        }

        Ok(session)
    }

    fn supervise(&self, mut child: Child, config: Config, on_teardown: impl FnOnce(u32)) {
        let result = self.supervise_inner(&mut child, &config);
        if let Err(e) = result {
            warn!("pid={}: {}", self.pid, e);
        }

        if child.try_wait().ok().flatten().is_none() {
            warn!("pid={}: killing lingering native debugger process", self.pid);
            let _ = child.kill();
            let _ = child.wait();
        }

        {
            let mut state = self.state.lock().expect("state mutex poisoned");
            if let Some(client) = state.client.take() {
                client.close();
            }
            state.gdb = None;
        }

        if let Err(e) = fs::remove_dir_all(&self.session_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("pid={}: failed to remove session directory: {}", self.pid, e);
            }
        }

        let (lock, cvar) = &*self.available;
        *lock.lock().expect("available mutex poisoned") = true;
        cvar.notify_all();

        on_teardown(self.pid);
    }

    fn supervise_inner(&self, child: &mut Child, config: &Config) -> Result<(), AttachError> {
        let deadline = Instant::now() + config.socket_wait;
        let mut logged_at = Instant::now();
        loop {
            if self.socket_path.exists() {
                break;
            }
            if Instant::now() >= deadline {
                return Err(AttachError::SocketTimeout(config.socket_wait));
            }
            if logged_at.elapsed() >= Duration::from_secs(1) {
                info!("pid={}: waiting for the session to get ready...", self.pid);
                logged_at = Instant::now();
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        let (client, gdb) = create_rpc_client(&self.socket_path)?;
        {
            let mut state = self.state.lock().expect("state mutex poisoned");
            state.client = Some(client);
            state.gdb = Some(gdb);
        }
        {
            let (lock, cvar) = &*self.available;
            *lock.lock().expect("available mutex poisoned") = true;
            cvar.notify_all();
        }

        loop {
            if self.terminate_requested.load(Ordering::SeqCst) {
                info!("pid={}: sending terminate request", self.pid);
                let client = self.state.lock().expect("state mutex poisoned").client.clone();
                if let Some(client) = client {
                    let _ = client.terminate_server();
                }
                let halt_deadline = Instant::now() + config.halt_wait;
                while Instant::now() < halt_deadline {
                    if child.try_wait()?.is_some() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                return Ok(());
            }
            if let Some(status) = child.try_wait()? {
                return Err(AttachError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("native debugger exited unexpectedly with {status}"),
                )));
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn context_dir(&self) -> &Path {
        &self.context_dir
    }

    /// The debugger-singleton stub (RPC object key 1).
    pub fn gdb(&self) -> GdbStub {
        self.state
            .lock()
            .expect("state mutex poisoned")
            .gdb
            .clone()
            .expect("session is available once attach() returns Ok")
    }

    /// Requests termination and, if `join` is true, blocks until the
    /// supervisor thread has finished tearing the session down.
    pub fn terminate(&self, join: bool) {
        self.terminate_requested.store(true, Ordering::SeqCst);
        if join {
            let handle = self.state.lock().expect("state mutex poisoned").supervisor.take();
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
    }
}

fn spawn_debugger(
    gdb_path: &Path,
    pid: u32,
    executable: &Path,
    context_dir: &Path,
    bootstrap_path: &Path,
) -> Result<Child, AttachError> {
    // `sys.path` extension points at the bootstrap script's own directory:
    // harmless for the self-contained default template, but keeps future
    // templates that `import` sibling modules working without another
    // spawn-argument change.
    let sys_path_dir = bootstrap_path.parent().unwrap_or_else(|| Path::new("."));

    Command::new(gdb_path)
        .arg("-q")
        .arg(executable)
        .arg("-p")
        .arg(pid.to_string())
        .arg("-batch")
        .arg("-ex")
        .arg("set trace-commands on")
        .arg("-ex")
        .arg(format!("set directories {}", context_dir.display()))
        .arg("-ex")
        .arg(format!("py sys.path.append('{}')", sys_path_dir.display()))
        .arg("-x")
        .arg(bootstrap_path)
        .stdin(Stdio::null())
        .spawn()
        .map_err(AttachError::Spawn)
}
