pub mod error;
pub mod listener;
pub mod rpc;
pub mod units;

pub use error::{CoreError, RpcError};
pub use listener::{ChainTipObserver, DeliveryMode, ListenerRegistry};
pub use rpc::{ClientConfig, ConnectionDescriptor, DaemonRpc, DecodeMode, HttpRpcClient};
