//! Stdio bridge for the interactive `attach` command. A prior tool in
//! this space shelled out to `nc -U <socket>`; this pumps bytes itself
//! with a pair of reader/writer threads instead, so it doesn't depend on
//! an external `nc` binary being present.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation handle for [`Bridge::run`]'s socket-appearance
/// wait. Cloning shares the same `disposed` flag, so a clone kept on one
/// thread can cancel a `run` blocking on another.
#[derive(Clone)]
pub struct Bridge {
    disposed: Arc<AtomicBool>,
}

impl Bridge {
    pub fn new() -> Bridge {
        Bridge { disposed: Arc::new(AtomicBool::new(false)) }
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    /// Waits for `socket_path` to appear (up to `wait`, polling every
    /// 100ms, logging every 1s), then pumps bytes between stdio and the
    /// socket until either side closes.
    pub fn run(&self, socket_path: &Path, wait: Duration) -> io::Result<()> {
        let deadline = Instant::now() + wait;
        let mut last_log = Instant::now();
        loop {
            if socket_path.exists() {
                break;
            }
            if self.disposed.load(Ordering::SeqCst) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out waiting for the attach-debugger socket to appear",
                ));
            }
            if last_log.elapsed() >= Duration::from_secs(1) {
                eprintln!("waiting for the session to get ready...");
                last_log = Instant::now();
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        if self.disposed.load(Ordering::SeqCst) {
            return Ok(());
        }

        let stream = UnixStream::connect(socket_path)?;
        eprintln!("session opened");

        let mut to_socket = stream.try_clone()?;
        let stdin_disposed = self.disposed.clone();
        let stdin_pump = std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                if stdin_disposed.load(Ordering::SeqCst) {
                    return;
                }
                let n = match io::stdin().read(&mut buf) {
                    Ok(0) | Err(_) => return,
                    Ok(n) => n,
                };
                if to_socket.write_all(&buf[..n]).is_err() {
                    return;
                }
            }
        });

        let mut from_socket = stream;
        let mut buf = [0u8; 4096];
        loop {
            let n = match from_socket.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            if io::stdout().write_all(&buf[..n]).is_err() {
                break;
            }
            let _ = io::stdout().flush();
        }

        self.dispose();
        let _ = stdin_pump.join();
        Ok(())
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}
