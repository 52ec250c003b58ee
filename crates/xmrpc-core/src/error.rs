/// Failures raised while talking to the remote node.
///
/// `HttpStatus` is produced before the body is read; `ServerError` is an
/// embedded application error found inside a successful HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("HTTP error: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("RPC server error {code}: {message}")]
    ServerError { code: i64, message: String },
}

impl RpcError {
    /// Classify a `reqwest` failure, keeping timeouts distinguishable.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("RPC communication failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("observer failed: {0}")]
    Observer(String),
}

impl CoreError {
    /// HTTP status of the failed exchange, if the node answered with one >= 400.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Rpc(RpcError::HttpStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Rpc(RpcError::Timeout(_)))
    }
}
