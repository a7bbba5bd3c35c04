/// Errors raised at the edges of the daemon (socket and wire format).
///
/// The overlay state machine itself never fails; see `overlay`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty command line")]
    EmptyLine,

    #[error("unknown signal: {0:?}")]
    UnknownSignal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
