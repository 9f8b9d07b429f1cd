/// Errors raised while fetching a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP {status} {code}: {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),

    #[error("source: {0}")]
    Source(String),
}
