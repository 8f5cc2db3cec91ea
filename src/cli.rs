//! Command-line surface: a single command group keyed on a target PID.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Command-line arguments
#[derive(Parser, Clone, Debug)]
#[command(author, version, about)]
pub struct Opts {
    /// Set a verbosity level
    ///
    /// Can be used multiple times to increase verbosity.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// PID of the target process to drive
    pub pid: u32,

    /// Absolute or resolvable path to the target's executable
    ///
    /// Guessed from `/proc/<pid>/exe` when not given.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub executable: Option<PathBuf>,

    /// Working directory the native debugger should search for sources
    ///
    /// Guessed from `/proc/<pid>/cwd` when not given.
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub context: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// List every thread and its interpreter frames
    Inspect,

    /// Inject a file, traversing frames until one succeeds
    RunFile {
        path: PathBuf,

        /// Only consider the thread with this number
        #[arg(short, long)]
        thread: Option<i64>,

        /// Only consider the frame with this index
        #[arg(short, long)]
        frame: Option<i64>,
    },

    /// Inject a literal source string, traversing frames until one succeeds
    RunScript {
        source: String,

        /// Only consider the thread with this number
        #[arg(short, long)]
        thread: Option<i64>,

        /// Only consider the frame with this index
        #[arg(short, long)]
        frame: Option<i64>,
    },

    /// Inject the attach-debugger template and bridge stdio to it
    Attach {
        /// Only consider the thread with this number
        #[arg(short, long)]
        thread: Option<i64>,

        /// Only consider the frame with this index
        #[arg(short, long)]
        frame: Option<i64>,

        /// Interactive debugger to drop the target into
        #[arg(short, long, default_value = "pdb")]
        debugger: String,
    },

    /// Launch a local interactive evaluator against the session
    Shell,
}
