use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Plan template not found: {0}")]
    TemplateNotFound(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Behavior not in plan: {0}")]
    UnknownBehavior(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
