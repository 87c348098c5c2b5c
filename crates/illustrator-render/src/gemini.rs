//! Blocking facade over the async Gemini client.
//!
//! Images are requested one at a time; the renderer owns a current-thread
//! tokio runtime and drives each request to completion.

use crate::api::{error_message, GenerateRequest, GenerateResponse, ImagePayload};
use crate::dimensions::image_dimensions;
use crate::error::{RenderError, Result};
use illustrator_core::model::{AspectRatio, RenderConfig, Resolution};
use illustrator_core::plan::{IllustrationRenderer, RenderRequest};
use image::ImageFormat;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

pub struct GeminiRenderer {
    client: Client,
    runtime: Runtime,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiRenderer {
    /// Create a renderer from the resolved render config.
    ///
    /// Fails with `MissingApiKey` when no key was configured.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RenderError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client,
            runtime,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Request one image and return the decoded payload.
    pub fn generate(&self, prompt: &str, aspect_ratio: AspectRatio, resolution: Resolution) -> Result<ImagePayload> {
        let body = GenerateRequest::image(prompt, aspect_ratio, resolution);
        self.runtime.block_on(self.send(&body))
    }

    async fn send(&self, body: &GenerateRequest) -> Result<ImagePayload> {
        debug!(url = %self.url(), model = %self.model, "requesting image");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RenderError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.first_image()
    }
}

/// Decode `payload` and write it as PNG, warning when the size is unexpected.
pub fn save_png(payload: &ImagePayload, path: &Path, expected: (u32, u32)) -> Result<()> {
    let image = image::load_from_memory(&payload.bytes)?;
    let actual = (image.width(), image.height());
    if actual != expected {
        warn!(?actual, ?expected, mime = %payload.mime_type, "image size differs from requested resolution");
    }
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

impl IllustrationRenderer for GeminiRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> anyhow::Result<PathBuf> {
        let payload = self.generate(request.prompt, request.aspect_ratio, request.resolution)?;
        let expected = image_dimensions(request.aspect_ratio, request.resolution);
        save_png(&payload, request.output_path, expected)?;
        info!(path = %request.output_path.display(), "saved illustration");
        Ok(request.output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use illustrator_core::model::IllustratorConfig;

    #[test]
    fn test_missing_api_key() {
        let config = IllustratorConfig::default();
        assert!(matches!(GeminiRenderer::new(&config.render), Err(RenderError::MissingApiKey)));

        let mut render = config.render.clone();
        render.api_key = Some("   ".to_string());
        assert!(matches!(GeminiRenderer::new(&render), Err(RenderError::MissingApiKey)));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let mut render = IllustratorConfig::default().render;
        render.api_key = Some("key".to_string());
        render.endpoint = "http://localhost:9000/".to_string();
        render.model = "img-model".to_string();

        let renderer = GeminiRenderer::new(&render).unwrap();
        assert_eq!(renderer.url(), "http://localhost:9000/v1beta/models/img-model:generateContent");
    }
}
