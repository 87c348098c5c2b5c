//! # illustrator render backend
//!
//! Implements the core `IllustrationRenderer` trait against Google's Gemini
//! image model over its REST `generateContent` endpoint.
//!
//! - Authenticates with the `x-goog-api-key` header (`GEMINI_API_KEY`)
//! - Requests image-only output at the configured aspect ratio and size
//! - Re-encodes whatever image format comes back as PNG
//!
//! There are no retries; a failed image is reported to the caller, which
//! moves on to the next section.

pub mod api;
pub mod dimensions;
pub mod error;
pub mod gemini;

pub use dimensions::image_dimensions;
pub use error::RenderError;
pub use gemini::GeminiRenderer;

use illustrator_core::model::RenderConfig;
use illustrator_core::plan::IllustrationRenderer;

/// Boxed renderer for the core `cmd_*` functions.
pub fn connect(config: &RenderConfig) -> anyhow::Result<Box<dyn IllustrationRenderer>> {
    Ok(Box::new(GeminiRenderer::new(config)?))
}
