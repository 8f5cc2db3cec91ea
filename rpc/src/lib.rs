//! Wire protocol, line-framed transport, identity registry and typed
//! stub client for talking to a bootstrapped in-debugger agent.
//!
//! The agent itself never runs as Rust — it is Python, executed inside
//! the native debugger's embedded interpreter. This crate is the other
//! half of that conversation: it owns the wire grammar, the blocking
//! Unix-socket transport, the client-side identity map, and a set of
//! typed proxies (`GdbStub`, `InferiorStub`, `ThreadStub`, `FrameStub`)
//! over the debugger's live objects.

mod client;
mod error;
mod proxies;
mod serializer;
mod transport;
mod wire;

pub use client::{classes, RpcClient};
pub use error::Error;
pub use proxies::{create_rpc_client, FrameStub, GdbStub, InferiorStub, ThreadStub};
pub use serializer::{Registry, Stub, Value};
pub use transport::{LineReassembler, LineTransport};
pub use wire::Wire;
