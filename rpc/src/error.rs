use thiserror::Error;

/// Everything that can go wrong while talking to the bootstrapped
/// in-debugger agent, from the transport up through stub method calls.
#[derive(Debug, Error)]
pub enum Error {
    /// The line-framed socket transport failed or was closed by the peer.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The connection was closed (by us or by the agent) before a reply
    /// arrived. Once `halt` has been
    /// sent, no later `call` may succeed silently.
    #[error("connection to the in-debugger agent is closed")]
    Closed,

    /// A decoded wire value didn't match the grammar here
    #[error("malformed wire value: {0}")]
    Malformed(String),

    /// `class` record named a class the client never registered a stub
    /// type for.
    #[error("no stub class registered for {0:?}")]
    UnknownClass(String),

    /// The member named in a reply did not decode into the shape the
    /// calling stub method expected.
    #[error("unexpected reply shape calling {class}.{member}: {detail}")]
    UnexpectedShape { class: &'static str, member: &'static str, detail: String },

    /// The agent raised an exception while servicing the call.
    #[error("remote exception from {class}: {message}")]
    Remote { class: String, message: String },

    /// The agent rejected the request itself (bad member, bad receiver,
    /// bad argument) without ever reaching target code.
    #[error("rpc error: {0}")]
    RpcError(String),
}
