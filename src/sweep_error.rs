use std::io;
use std::path::PathBuf;

pub type SweepResult<T> = std::result::Result<T, SweepError>;

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// Raw socket creation, send or receive failed. Always fatal for the run.
    #[error("socket error: {0}")]
    Socket(#[source] io::Error),

    #[error("output error: {0}")]
    Output(#[source] io::Error),

    #[error("cannot read {}: {source}", .path.display())]
    ReadInput { path: PathBuf, source: io::Error },

    #[error("input error on line {line}: {message}")]
    Input { line: usize, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("scan interrupted")]
    Interrupted,

    #[error("worker thread panicked")]
    WorkerPanicked,
}

impl SweepError {
    pub(crate) fn input(line: usize, message: impl Into<String>) -> Self {
        SweepError::Input { line, message: message.into() }
    }
}
