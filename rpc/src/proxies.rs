use std::path::Path;
use std::sync::Arc;

use crate::client::{classes, RpcClient};
use crate::error::Error;
use crate::serializer::{Stub, Value};
use crate::wire::Wire;

fn unexpected(class: &'static str, member: &'static str, detail: impl Into<String>) -> Error {
    Error::UnexpectedShape { class, member, detail: detail.into() }
}

/// Connects to the bootstrap server's socket and binds the debugger
/// singleton stub at key 1.
pub fn create_rpc_client(socket_path: &Path) -> Result<(Arc<RpcClient>, GdbStub), Error> {
    let client = RpcClient::connect(socket_path)?;
    let stub = client.get_stub(classes::GDB, 1);
    Ok((client.clone(), GdbStub { stub }))
}

/// The debugger proxy singleton.
#[derive(Clone)]
pub struct GdbStub {
    stub: Arc<Stub>,
}

impl GdbStub {
    pub fn list_inferiors(&self) -> Result<Vec<InferiorStub>, Error> {
        let value = self.stub.call("inferiors", vec![])?;
        value
            .into_list()?
            .into_iter()
            .map(|v| v.into_stub().map(|s| InferiorStub { stub: s }))
            .collect()
    }

    pub fn selected_inferior(&self) -> Result<InferiorStub, Error> {
        Ok(InferiorStub { stub: self.stub.call("selected_inferior", vec![])?.into_stub()? })
    }

    pub fn selected_thread(&self) -> Result<Option<ThreadStub>, Error> {
        let value = self.stub.call("selected_thread", vec![])?;
        if value.is_none() {
            return Ok(None);
        }
        Ok(Some(ThreadStub { stub: value.into_stub()? }))
    }

    /// Executes a raw debugger command and returns its captured text
    /// output (used by the GIL acquire/release dance in proxies' frame
    /// evaluation, and by `shell`'s escape hatch).
    pub fn execute(&self, command: &str) -> Result<String, Error> {
        self.stub.call("execute", vec![Wire::str(command)])?.into_string()
    }
}

/// The inferior proxy.
#[derive(Clone)]
pub struct InferiorStub {
    stub: Arc<Stub>,
}

impl InferiorStub {
    pub fn pid(&self) -> Result<i64, Error> {
        self.stub.call("pid", vec![])?.into_i64()
    }

    pub fn num(&self) -> Result<i64, Error> {
        self.stub.call("num", vec![])?.into_i64()
    }

    pub fn was_attached(&self) -> Result<bool, Error> {
        self.stub.call("was_attached", vec![])?.into_bool()
    }

    pub fn is_valid(&self) -> Result<bool, Error> {
        self.stub.call("is_valid", vec![])?.into_bool()
    }

    pub fn threads(&self) -> Result<Vec<ThreadStub>, Error> {
        let value = self.stub.call("threads", vec![])?;
        value
            .into_list()?
            .into_iter()
            .map(|v| v.into_stub().map(|s| ThreadStub { stub: s }))
            .collect()
    }
}

/// The thread proxy.
#[derive(Clone)]
pub struct ThreadStub {
    stub: Arc<Stub>,
}

impl ThreadStub {
    pub fn num(&self) -> Result<i64, Error> {
        self.stub.call("num", vec![])?.into_i64()
    }

    pub fn global_num(&self) -> Result<i64, Error> {
        self.stub.call("global_num", vec![])?.into_i64()
    }

    pub fn ptid(&self) -> Result<(i64, i64, i64), Error> {
        let items = self.stub.call("ptid", vec![])?.into_list()?;
        if items.len() != 3 {
            return Err(unexpected("ThreadWrapper", "ptid", "expected a 3-tuple"));
        }
        let mut it = items.into_iter();
        Ok((
            it.next().unwrap().into_i64()?,
            it.next().unwrap().into_i64()?,
            it.next().unwrap().into_i64()?,
        ))
    }

    pub fn name(&self) -> Result<Option<String>, Error> {
        let value = self.stub.call("name", vec![])?;
        if value.is_none() {
            return Ok(None);
        }
        Ok(Some(value.into_string()?))
    }

    pub fn is_running(&self) -> Result<bool, Error> {
        self.stub.call("is_running", vec![])?.into_bool()
    }

    pub fn is_exited(&self) -> Result<bool, Error> {
        self.stub.call("is_exited", vec![])?.into_bool()
    }

    pub fn is_stopped(&self) -> Result<bool, Error> {
        self.stub.call("is_stopped", vec![])?.into_bool()
    }

    pub fn is_valid(&self) -> Result<bool, Error> {
        self.stub.call("is_valid", vec![])?.into_bool()
    }

    pub fn is_selected(&self) -> Result<bool, Error> {
        self.stub.call("is_selected", vec![])?.into_bool()
    }

    /// Makes this thread current. Required before `python_frames`, whose
    /// precondition is that the thread is currently selected.
    pub fn switch(&self) -> Result<(), Error> {
        self.stub.call("switch", vec![])?;
        Ok(())
    }

    /// Enumerates interpreter call frames from newest to oldest,
    /// retaining only native frames the debugger's interpreter-frame
    /// extension recognizes. Fails with an rpc-error surfaced remote
    /// exception if this thread isn't currently selected.
    pub fn python_frames(&self) -> Result<Vec<FrameStub>, Error> {
        let value = self.stub.call("get_python_frames", vec![])?;
        value
            .into_list()?
            .into_iter()
            .map(|v| v.into_stub().map(|s| FrameStub { stub: s }))
            .collect()
    }
}

/// The frame proxy.
#[derive(Clone)]
pub struct FrameStub {
    stub: Arc<Stub>,
}

impl FrameStub {
    pub fn filename(&self) -> Result<Option<String>, Error> {
        let value = self.stub.call("filename", vec![])?;
        if value.is_none() {
            return Ok(None);
        }
        Ok(Some(value.into_string()?))
    }

    pub fn current_line_num(&self) -> Result<Option<i64>, Error> {
        let value = self.stub.call("current_line_num", vec![])?;
        if value.is_none() {
            return Ok(None);
        }
        Ok(Some(value.into_i64()?))
    }

    pub fn current_line(&self) -> Result<Option<String>, Error> {
        let value = self.stub.call("current_line", vec![])?;
        if value.is_none() {
            return Ok(None);
        }
        Ok(Some(value.into_string()?))
    }

    pub fn is_optimized_out(&self) -> Result<bool, Error> {
        self.stub.call("is_optimized_out", vec![])?.into_bool()
    }

    pub fn is_eval_frame(&self) -> Result<bool, Error> {
        self.stub.call("is_eval_frame", vec![])?.into_bool()
    }

    /// Returns `false`, or a short descriptive string naming the other
    /// interpreter that owns this frame.
    pub fn other_interpreter_frame(&self) -> Result<Option<String>, Error> {
        let value = self.stub.call("is_other_interpreter_frame", vec![])?;
        match value {
            Value::Int(0) => Ok(None),
            Value::Str(s) => Ok(Some(s)),
            other => Err(unexpected(
                "FrameWrapper",
                "is_other_interpreter_frame",
                format!("expected bool-false or str, got {other:?}"),
            )),
        }
    }

    /// Number of newer frames between this one and the newest.
    pub fn index(&self) -> Result<i64, Error> {
        self.stub.call("get_index", vec![])?.into_i64()
    }

    pub fn is_selected(&self) -> Result<bool, Error> {
        self.stub.call("check_selected", vec![])?.into_bool()
    }

    pub fn select(&self) -> Result<(), Error> {
        self.stub.call("select", vec![])?;
        Ok(())
    }

    pub fn local_variables(&self) -> Result<Vec<String>, Error> {
        self.stub
            .call("list_local_variables", vec![])?
            .into_list()?
            .into_iter()
            .map(Value::into_string)
            .collect()
    }

    pub fn global_variables(&self) -> Result<Vec<String>, Error> {
        self.stub
            .call("list_global_variables", vec![])?
            .into_list()?
            .into_iter()
            .map(Value::into_string)
            .collect()
    }

    /// Returns `(scope, truncated repr)` for a variable, or `None` if no
    /// binding was found.
    pub fn variable_repr(&self, name: &str, max_len: i64) -> Result<Option<(String, String)>, Error> {
        let value = self.stub.call(
            "get_variable_repr",
            vec![Wire::str(name), Wire::int(max_len)],
        )?;
        if value.is_none() {
            return Ok(None);
        }
        let items = value.into_list()?;
        if items.len() != 2 {
            return Err(unexpected("FrameWrapper", "get_variable_repr", "expected a 2-tuple"));
        }
        let mut it = items.into_iter();
        Ok(Some((it.next().unwrap().into_string()?, it.next().unwrap().into_string()?)))
    }

    /// Evaluates `source` under the target's global interpreter lock.
    /// Embedded double-quotes are escaped server-side before the
    /// debugger command is built; this call sends the raw source
    /// unescaped and trusts the server's proxy to do that escaping.
    pub fn run_simple_string(&self, source: &str) -> Result<(), Error> {
        self.stub.call("run_simple_string", vec![Wire::str(source)])?;
        Ok(())
    }

    /// Reads and executes a file inside the target by evaluating
    /// `with open(<path>) as f: exec(f.read())`. Rejects a path
    /// containing a quote character with a hard local error before
    /// issuing any debugger command.
    pub fn run_file(&self, path: &str) -> Result<(), Error> {
        if path.contains('\'') || path.contains('"') {
            return Err(Error::RpcError(format!(
                "refusing to inject a path containing a quote character: {path:?}"
            )));
        }
        self.stub.call("run_file", vec![Wire::str(path)])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_file_rejects_single_and_double_quotes() {
        let stub = Arc::new(Stub::new(classes::FRAME, 1, std::sync::Weak::new()));
        let frame = FrameStub { stub };
        assert!(frame.run_file("/tmp/evil'.py").is_err());
        assert!(frame.run_file("/tmp/evil\".py").is_err());
    }
}
