use std::time::Duration;

/// Diagram rendering error.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("renderer exited with {status}: {stderr}")]
    Process { status: String, stderr: String },
    #[error("rendering timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The whole-call deadline expired. Not recoverable per diagram.
    #[error("diagram deadline of {}ms exceeded", .0.as_millis())]
    DeadlineExceeded(Duration),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("failed to launch renderer: {0}")]
    Launch(String),
}
