use crate::error::IllustratorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_STYLES_DIR: &str = "styles";
pub const DEFAULT_MAX_BODY_CHARS: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "3:4")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Portrait => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = IllustratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Wide),
            "3:4" => Ok(AspectRatio::Portrait),
            other => Err(IllustratorError::InvalidAspectRatio(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::TwoK => "2K",
            Resolution::FourK => "4K",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = IllustratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "2K" => Ok(Resolution::TwoK),
            "4K" => Ok(Resolution::FourK),
            _ => Err(IllustratorError::InvalidResolution(s.to_string())),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IllustratorConfig {
    pub paths: Paths,
    pub defaults: Defaults,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub styles_dir: String,
    /// `None` means `<document dir>/images`.
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Defaults {
    pub level: Option<String>,
    pub style: Option<String>,
}

#[derive(Clone, PartialEq)]
pub struct RenderConfig {
    pub model: String,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub max_body_chars: usize,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
}

// Keep the key out of debug output.
impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("model", &self.model)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("resolution", &self.resolution)
            .field("max_body_chars", &self.max_body_chars)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for IllustratorConfig {
    fn default() -> Self {
        Self {
            paths: Paths {
                styles_dir: DEFAULT_STYLES_DIR.to_string(),
                output_dir: None,
            },
            defaults: Defaults::default(),
            render: RenderConfig {
                model: DEFAULT_MODEL.to_string(),
                aspect_ratio: AspectRatio::default(),
                resolution: Resolution::default(),
                max_body_chars: DEFAULT_MAX_BODY_CHARS,
                endpoint: DEFAULT_ENDPOINT.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                api_key: None,
            },
        }
    }
}

/// On-disk config layer; every field optional so files can override piecemeal.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub paths: Option<PartialPaths>,
    pub defaults: Option<PartialDefaults>,
    pub render: Option<PartialRender>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialPaths {
    #[serde(rename = "stylesDir")]
    pub styles_dir: Option<String>,
    #[serde(rename = "outputDir")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialDefaults {
    pub level: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRender {
    pub model: Option<String>,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<Resolution>,
    /// Zero is rejected when the file is parsed.
    #[serde(rename = "maxBodyChars")]
    pub max_body_chars: Option<NonZeroUsize>,
    pub endpoint: Option<String>,
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aspect_ratio_and_resolution() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Wide);
        assert_eq!("3:4".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert!("4:3".parse::<AspectRatio>().is_err());
        assert_eq!("4k".parse::<Resolution>().unwrap(), Resolution::FourK);
        assert!("8K".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_partial_render_from_toml() {
        let cfg: PartialConfig = toml::from_str(
            r#"
[render]
aspectRatio = "3:4"
resolution = "4K"
maxBodyChars = 500
"#,
        )
        .unwrap();
        let render = cfg.render.unwrap();
        assert_eq!(render.aspect_ratio, Some(AspectRatio::Portrait));
        assert_eq!(render.resolution, Some(Resolution::FourK));
        assert_eq!(render.max_body_chars.map(NonZeroUsize::get), Some(500));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<PartialConfig, _> = toml::from_str("[render]\ncolour = \"red\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut cfg = IllustratorConfig::default();
        cfg.render.api_key = Some("secret-key".to_string());
        let debug = format!("{:?}", cfg.render);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
