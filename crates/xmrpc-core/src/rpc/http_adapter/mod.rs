//! Monero daemon RPC over HTTP(S).
//!
//! [`HttpRpcClient`] encodes a call for its [`Dialect`], sends it through a
//! digest-aware transport, and decodes the typed result. It implements
//! [`DaemonRpc`](super::DaemonRpc) on top of that single dispatch path.

mod client;
mod connection;
mod digest;
mod protocol;
mod transport;

pub use client::{ClientConfig, HttpRpcClient};
pub use connection::{ConnectionDescriptor, Credentials};
pub use protocol::{
    encode_request, Dialect, EmbeddedError, MethodDescriptor, RpcRequest, DEFAULT_REQUEST_ID,
    JSON_RPC_PATH, JSON_RPC_VERSION,
};
