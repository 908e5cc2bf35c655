use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Pin not found: {0}")]
    PinNotFound(Uuid),

    #[error("Pin {pin} belongs to another user")]
    NotAuthor { pin: Uuid },

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Get closer to the pin to see it ({distance:.1} m away)")]
    TooFar { distance: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
