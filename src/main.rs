use std::env;
use std::process::ExitCode;

use clap::Parser;
use injectcore::{Command, Config, Controller, Opts};
use log::error;

fn main() -> ExitCode {
    let opts = Opts::parse();

    if env::var("RUST_LOG").is_err() {
        env::set_var(
            "RUST_LOG",
            match opts.verbose {
                0 => "error",
                1 => "warn",
                2 => "info",
                3 => "debug",
                _ => "trace",
            },
        );
    }
    env_logger::init();

    if !injectcore::target_exists(opts.pid) {
        eprintln!("notice: pid {} does not currently exist; proceeding anyway", opts.pid);
    }

    let config = Config::default();
    let controller = match Controller::new(config.clone()) {
        Ok(controller) => controller,
        Err(e) => {
            error!("failed to set up a scratch directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let session = match controller.attach(opts.pid, opts.executable, opts.context) {
        Ok(session) => session,
        Err(e) => {
            error!("attach failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match opts.command {
        Command::Inspect => injectcore::inspect(&session),
        Command::RunFile { path, thread, frame } => injectcore::run_file(&session, &path, thread, frame),
        Command::RunScript { source, thread, frame } => {
            injectcore::run_script(&session, &source, thread, frame)
        }
        Command::Attach { thread, frame, debugger } => {
            injectcore::attach(&session, &config, thread, frame, &debugger)
        }
        Command::Shell => injectcore::shell(&session),
    };

    controller.remove(opts.pid);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
