use std::time::Duration;

/// Resolved from environment variables and command-line options: a small
/// plain struct, not a builder.
#[derive(Clone, PartialEq, Debug)]
pub struct Config {
    /// Name of the native debugger binary, resolved on `PATH` with `which`.
    ///
    /// Defaults to `gdb`; override with `INJECTD_GDB_BIN`.
    pub gdb_bin: String,

    /// How long `attach` waits for the bootstrap socket to appear before
    /// giving up.
    pub socket_wait: Duration,

    /// How long `terminate` waits for the native debugger to exit after
    /// `halt` before killing it.
    pub halt_wait: Duration,

    /// How long the `attach` CLI command waits for the in-target bridge
    /// socket to appear.
    pub bridge_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gdb_bin: std::env::var("INJECTD_GDB_BIN").unwrap_or_else(|_| "gdb".into()),
            socket_wait: Duration::from_secs(10),
            halt_wait: Duration::from_secs(10),
            bridge_wait: Duration::from_secs(100),
        }
    }
}
