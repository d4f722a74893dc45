use thiserror::Error;

/// Stage-level error taxonomy. Each pipeline stage fails with its own
/// variant so a run's failure point is visible from the error alone.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("config error: {0}")]
    Config(String),

    #[error("keyword source error: {0}")]
    DataSource(String),

    #[error("content generation error: {0}")]
    Generation(String),

    #[error("media upload error: {0}")]
    Upload(String),

    #[error("publish error: {0}")]
    Publish(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }
}
