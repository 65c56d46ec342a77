/// Convenience result type used across tokenforge.
pub type TokenforgeResult<T> = Result<T, TokenforgeError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TokenforgeError {
    /// Invalid user-provided input (colors, options, identifiers).
    #[error("validation error: {0}")]
    Validation(String),

    /// Degenerate or out-of-range geometry (zero-area surfaces and the like).
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Source image bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Rasterizer or pixel-buffer failures while drawing.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TokenforgeError {
    /// Build a [`TokenforgeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TokenforgeError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`TokenforgeError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`TokenforgeError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
