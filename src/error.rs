//! Error types
//!
//! Errors only surface while setting a game up (settings, arena, store,
//! threads). Once a run is going, game logic clamps instead of failing.

/// Errors that can occur while configuring or hosting a game
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Arena dimensions are not finite or below the supported minimum
    #[error("Invalid arena dimensions: {width}x{height}")]
    InvalidArena { width: f32, height: f32 },

    /// A settings value is out of range
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// I/O error (settings file, score file, thread spawn)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a settings or score file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The score store rejected a read or write
    #[error("Score store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Result type for fallible setup operations
pub type Result<T> = std::result::Result<T, Error>;
