/// Core error type.
///
/// Adapter crates map their specific errors into this type so callers can tell
/// a rejected request (`Api`) from a broken payload (`Decode`) or a dead
/// connection (`Transport`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// The service answered `ok: false`.
    #[error("api error {code}: {description}")]
    Api { code: i32, description: String },

    /// Malformed or truncated JSON, or a mandatory field that could not be read.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    /// Reading a local file for upload failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("update handler failed: {0}")]
    Handler(String),
}

impl Error {
    /// Protocol error code, if this is an `ok: false` answer.
    pub fn api_code(&self) -> Option<i32> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_api_code(&self, code: i32) -> bool {
        self.api_code() == Some(code)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
