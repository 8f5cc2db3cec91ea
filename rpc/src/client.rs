use std::path::Path;
use std::sync::{Arc, Mutex, Weak};

use serde_json::{json, Value as Json};

use crate::error::Error;
use crate::serializer::{self, Registry, Stub, Value};
use crate::transport::LineTransport;
use crate::wire::Wire;

/// The RPC client driven by the controller. Owns the
/// transport and the client-side identity registry. `call` is the only
/// blocking operation: it serializes arguments, sends one `request`
/// frame, blocks on `receive`, and decodes exactly one reply, matching
/// the server's strict per-connection FIFO.
///
/// Holds a `Weak` handle to itself so stubs it vends can call back in
/// without the client needing an `Arc<Self>`-shaped receiver on every
/// method.
pub struct RpcClient {
    transport: Mutex<LineTransport>,
    registry: Registry,
    closed: std::sync::atomic::AtomicBool,
    myself: Weak<RpcClient>,
}

impl RpcClient {
    pub fn connect(socket_path: &Path) -> Result<Arc<Self>, Error> {
        let transport = LineTransport::connect(socket_path)?;
        Ok(Arc::new_cyclic(|myself| Self {
            transport: Mutex::new(transport),
            registry: Registry::new(),
            closed: std::sync::atomic::AtomicBool::new(false),
            myself: myself.clone(),
        }))
    }

    /// Issues one call and decodes the reply. `receiver_key`, if given,
    /// is sent as the request's `i` field so the server resolves the
    /// receiver through its identity map before dispatch.
    pub fn call(
        &self,
        class_name: &'static str,
        member: &str,
        args: Vec<Wire>,
        receiver_key: Option<i64>,
    ) -> Result<Value, Error> {
        if self.closed.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        let mut request = serde_json::Map::new();
        request.insert("s".into(), json!("request"));
        request.insert("m".into(), json!(class_name));
        request.insert("f".into(), json!(member));
        request.insert("a".into(), Json::Array(args.iter().map(Wire::to_json).collect()));
        if let Some(key) = receiver_key {
            request.insert("i".into(), json!(key));
        }
        let frame = Json::Object(request).to_string();

        let reply = {
            let mut transport = self.transport.lock().expect("transport mutex poisoned");
            transport.send(&frame)?;
            transport.receive()?
        };
        self.decode_reply(&reply)
    }

    fn decode_reply(&self, raw: &str) -> Result<Value, Error> {
        let parsed: Json = serde_json::from_str(raw)
            .map_err(|e| Error::Malformed(format!("reply is not valid JSON: {e}")))?;
        let obj = parsed
            .as_object()
            .ok_or_else(|| Error::Malformed("reply is not a JSON object".into()))?;
        let kind = obj
            .get("s")
            .and_then(Json::as_str)
            .ok_or_else(|| Error::Malformed("reply missing string field `s`".into()))?;
        match kind {
            "response" => {
                let r = obj.get("r").ok_or_else(|| Error::Malformed("response missing `r`".into()))?;
                let wire = Wire::from_json(r)?;
                serializer::deserialize(&wire, &self.registry, &self.myself, classes::lookup, true)
            }
            "exception" => {
                let class = obj.get("c").and_then(Json::as_str).unwrap_or("<unknown>").to_string();
                let message = obj.get("r").and_then(Json::as_str).unwrap_or("").to_string();
                Err(Error::Remote { class, message })
            }
            "rpc-error" => {
                let message = obj.get("r").and_then(Json::as_str).unwrap_or("").to_string();
                Err(Error::RpcError(message))
            }
            other => Err(Error::Malformed(format!("unexpected reply kind {other:?}"))),
        }
    }

    /// Binds a stub to a known `(class, key)` identity without a round
    /// trip, used once at session start to obtain the debugger-singleton
    /// stub (key = 1).
    pub fn get_stub(&self, class_name: &'static str, key: i64) -> Arc<Stub> {
        self.registry
            .resolve(class_name, key, &self.myself, true)
            .expect("resolving with create_stub=true never fails")
            .expect("create_stub=true always yields a stub")
    }

    /// Sends `halt` with no expectation of a response, then marks the
    /// client closed. Any later `call` fails with `Error::Closed` rather
    /// than hanging.
    pub fn terminate_server(&self) -> Result<(), Error> {
        let frame = json!({"s": "halt"}).to_string();
        let result = {
            let mut transport = self.transport.lock().expect("transport mutex poisoned");
            transport.send(&frame)
        };
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        result
    }

    pub fn close(&self) {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        let mut transport = self.transport.lock().expect("transport mutex poisoned");
        let _ = transport.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Known stub classes, named the way the bootstrap template's Python
/// proxy classes are named. Kept as a flat lookup since the
/// server never registers a class the client doesn't already know how
/// to wrap.
pub mod classes {
    pub const GDB: &str = "GdbWrapper";
    pub const INFERIOR: &str = "InferiorWrapper";
    pub const THREAD: &str = "ThreadWrapper";
    pub const FRAME: &str = "FrameWrapper";

    pub fn lookup(name: &str) -> Option<&'static str> {
        match name {
            "GdbWrapper" => Some(GDB),
            "InferiorWrapper" => Some(INFERIOR),
            "ThreadWrapper" => Some(THREAD),
            "FrameWrapper" => Some(FRAME),
            _ => None,
        }
    }
}
