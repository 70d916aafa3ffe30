pub type ImprintResult<T> = Result<T, ImprintError>;

#[derive(thiserror::Error, Debug)]
pub enum ImprintError {
    #[error("config error: {0}")]
    Config(String),

    #[error("content error: {0}")]
    Content(String),

    #[error("unknown operation '{name}' at step {index}")]
    UnknownOperation { name: String, index: usize },

    #[error("operation '{op}': {detail}")]
    Params { op: &'static str, detail: String },

    #[error("filter error: {0}")]
    Filter(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImprintError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn content(msg: impl Into<String>) -> Self {
        Self::Content(msg.into())
    }

    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    pub fn params(op: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Params {
            op,
            detail: detail.to_string(),
        }
    }
}
