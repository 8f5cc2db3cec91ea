//! CLI command bodies. Each command resolves the target's first
//! inferior, then drives a traversal (`run-file`/`run-script`/`attach`)
//! or a one-shot visit (`inspect`).

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use inject_rpc::InferiorStub;

use crate::bridge::Bridge;
use crate::config::Config;
use crate::error::Error;
use crate::session::Session;
use crate::templates;
use crate::traverse;

fn first_inferior(session: &Session) -> Result<InferiorStub, Error> {
    session
        .gdb()
        .list_inferiors()?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Rejected(format!("pid {} reports no inferiors", session.pid())))
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// `inspect`. Thread sections are headed `Frame [num=N]` — a thread
/// section labeled "Frame" is an established part of this output's
/// shape and is kept verbatim; see DESIGN.md.
pub fn inspect(session: &Session) -> Result<(), Error> {
    let inferior = first_inferior(session)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    traverse::visit(
        &inferior,
        |thread| {
            let _ = writeln!(
                out,
                "=== Frame [num={}] ===\n - name: {}\n - ptid: {}\n - global_num: {}\n - is_running: {}\n - is_exited: {}\n - is_stopped: {}\n - available python frames",
                thread.num().unwrap_or(-1),
                thread.name().ok().flatten().unwrap_or_else(|| "<unknown>".into()),
                thread
                    .ptid()
                    .map(|(p, l, t)| format!("({p}, {l}, {t})"))
                    .unwrap_or_else(|_| "(?, ?, ?)".into()),
                thread.global_num().unwrap_or(-1),
                thread.is_running().unwrap_or(false),
                thread.is_exited().unwrap_or(false),
                thread.is_stopped().unwrap_or(false),
            );
            true
        },
        |frame| {
            let description = describe_frame(frame);
            let _ = writeln!(out, "   * Frame #{}: {}", frame.index().unwrap_or(-1), description);
            true
        },
        |_frame| false,
    )?;
    Ok(())
}

fn describe_frame(frame: &inject_rpc::FrameStub) -> String {
    match frame.is_eval_frame() {
        Ok(true) => match (frame.filename(), frame.current_line_num()) {
            (Ok(Some(filename)), Ok(Some(line))) => format!("File={filename}:{line}"),
            _ => "(unable to read python frame information)".to_string(),
        },
        Ok(false) => match frame.other_interpreter_frame() {
            Ok(Some(description)) => description,
            _ => "(Unknown Frame)".to_string(),
        },
        Err(_) => "(Unknown Frame)".to_string(),
    }
}

fn print_result_message(out: &mut impl Write, matched: bool) {
    if matched {
        let _ = writeln!(out, "Ran successfully");
    } else {
        let _ = writeln!(out, "Traversed all matched frames, but couldn't run successfully");
        let _ = writeln!(out, "HINT: Try without --thread or --frame option");
    }
}

/// `run-file`.
pub fn run_file(
    session: &Session,
    path: &Path,
    thread: Option<i64>,
    frame: Option<i64>,
) -> Result<(), Error> {
    let path = absolute(path)?;
    let path_str = path.to_string_lossy().into_owned();
    let inferior = first_inferior(session)?;

    let matched = traverse::traverse_frame(
        &inferior,
        |frame| frame.run_file(&path_str).is_ok(),
        thread,
        frame,
    )?;
    print_result_message(&mut io::stdout(), matched);
    Ok(())
}

/// `run-script`.
pub fn run_script(
    session: &Session,
    script: &str,
    thread: Option<i64>,
    frame: Option<i64>,
) -> Result<(), Error> {
    let inferior = first_inferior(session)?;
    let matched = traverse::traverse_frame(
        &inferior,
        |frame| frame.run_simple_string(script).is_ok(),
        thread,
        frame,
    )?;
    print_result_message(&mut io::stdout(), matched);
    Ok(())
}

/// `attach`. Renders the attach-debugger template into a
/// throwaway temp directory, injects it via `run_file`, and bridges stdio
/// to the socket it opens inside the target.
pub fn attach(
    session: &Session,
    config: &Config,
    thread: Option<i64>,
    frame: Option<i64>,
    debugger: &str,
) -> Result<(), Error> {
    let bridge_root = tempfile::Builder::new()
        .prefix("injectd_dbg_")
        .tempdir()
        .map_err(|e| Error::Rejected(format!("couldn't create a scratch directory: {e}")))?;
    let socket_path = bridge_root.path().join("proc.sock");
    let script_path = bridge_root.path().join("script.py");

    let rendered = templates::render_attach(debugger, &socket_path.to_string_lossy())
        .map_err(|e| Error::Rejected(e.to_string()))?;
    std::fs::write(&script_path, rendered)?;

    let bridge = Bridge::new();
    let bridge_wait = config.bridge_wait;
    let bridge_thread = {
        let socket_path = socket_path.clone();
        let bridge = bridge.clone();
        std::thread::spawn(move || bridge.run(&socket_path, bridge_wait))
    };

    let inferior = first_inferior(session)?;
    let script_path_str = script_path.to_string_lossy().into_owned();
    let run_result =
        traverse::traverse_frame(&inferior, |frame| frame.run_file(&script_path_str).is_ok(), thread, frame);

    bridge.dispose();
    if let Ok(Err(e)) = bridge_thread.join() {
        log::warn!("attach bridge ended: {e}");
    }

    let matched = run_result?;
    if !matched {
        print_result_message(&mut io::stdout(), matched);
    }
    Ok(())
}

/// `shell`. Binding a live debugger session as an arbitrary object in a
/// dynamic REPL namespace has no equivalent in a statically-typed
/// program, so this exposes the same session through a small
/// line-oriented command loop instead (see DESIGN.md).
pub fn shell(session: &Session) -> Result<(), Error> {
    println!();
    println!("=== INJECTD SHELL ===");
    println!("Attached to pid={}. Commands: inspect, execute <cmd>, quit", session.pid());
    println!("=====================");
    println!();

    let stdin = io::stdin();
    loop {
        print!("injectd> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "inspect" {
            if let Err(e) = inspect(session) {
                eprintln!("error: {e}");
            }
            continue;
        }
        if let Some(cmd) = line.strip_prefix("execute ") {
            match session.gdb().execute(cmd) {
                Ok(output) => print!("{output}"),
                Err(e) => eprintln!("error: {e}"),
            }
            continue;
        }
        println!("unknown command {line:?}; try: inspect, execute <cmd>, quit");
    }
    println!("Bye.");
    Ok(())
}
