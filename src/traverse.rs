//! Frame traversal. Walks every thread of an inferior, switches to each
//! in turn, and tries a predicate against every interpreter frame until
//! one succeeds or the candidates are exhausted (per-frame failures are
//! soft: a thread or frame that can't satisfy the predicate is simply
//! skipped in favor of the next candidate).

use inject_rpc::{Error, FrameStub, InferiorStub, ThreadStub};

/// Visits every thread of `inferior` passing `visit_thread`, switching to
/// it, then every interpreter frame of that thread passing `visit_frame`.
/// Returns `Ok(true)` as soon as `frame_predicate` succeeds on a visited
/// frame, `Ok(false)` if every candidate was tried and none matched.
pub fn visit(
    inferior: &InferiorStub,
    mut visit_thread: impl FnMut(&ThreadStub) -> bool,
    mut visit_frame: impl FnMut(&FrameStub) -> bool,
    mut frame_predicate: impl FnMut(&FrameStub) -> bool,
) -> Result<bool, Error> {
    for thread in inferior.threads()? {
        if !visit_thread(&thread) {
            continue;
        }

        thread.switch()?;
        for frame in thread.python_frames()? {
            if !visit_frame(&frame) {
                continue;
            }
            if frame_predicate(&frame) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// `visit` specialized to the `--thread`/`--frame` CLI filters: a thread
/// or frame index that fails to resolve (e.g. an RPC error reading
/// `thread.num()`) is treated as not matching rather than aborting the
/// whole traversal.
pub fn traverse_frame(
    inferior: &InferiorStub,
    predicate: impl FnMut(&FrameStub) -> bool,
    thread_id: Option<i64>,
    frame_idx: Option<i64>,
) -> Result<bool, Error> {
    visit(
        inferior,
        |thread| thread_id.map_or(true, |want| thread.num().map(|got| got == want).unwrap_or(false)),
        |frame| frame_idx.map_or(true, |want| frame.index().map(|got| got == want).unwrap_or(false)),
        predicate,
    )
}
