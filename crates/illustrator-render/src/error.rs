//! Renderer error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("GEMINI_API_KEY is not set; export it or add render.apiKey to illustrator.toml")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the image API.
    #[error("image API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response contained no image data")]
    NoImageData,

    #[error("invalid base64 image payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
