//! Visual style presets and style-prompt extraction.
//!
//! A style file is a markdown document describing an illustration style. Only
//! its core prompt is sent to the image model; overview and model-compatibility
//! notes are stripped.

use crate::error::IllustratorError;
use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    GradientGlass,
    Ticket,
    VectorIllustration,
}

impl StylePreset {
    pub const ALL: [StylePreset; 3] = [
        StylePreset::GradientGlass,
        StylePreset::Ticket,
        StylePreset::VectorIllustration,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            StylePreset::GradientGlass => "gradient-glass",
            StylePreset::Ticket => "ticket",
            StylePreset::VectorIllustration => "vector-illustration",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StylePreset::GradientGlass => "Gradient glass card",
            StylePreset::Ticket => "Ticket",
            StylePreset::VectorIllustration => "Vector illustration",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StylePreset::GradientGlass => "modern and technical, frosted glass, futuristic",
            StylePreset::Ticket => "black and white contrast, minimal, premium",
            StylePreset::VectorIllustration => "flat illustration, soft colours, warm and friendly",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.md", self.slug())
    }

    /// `<styles_dir>/<slug>.md`, which must exist.
    pub fn resolve(self, styles_dir: &Path) -> Result<PathBuf, IllustratorError> {
        let path = styles_dir.join(self.file_name());
        if !path.is_file() {
            return Err(IllustratorError::StyleFileNotFound(path));
        }
        Ok(path)
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.display_name(), self.description())
    }
}

impl FromStr for StylePreset {
    type Err = IllustratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StylePreset::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IllustratorError::UnknownStyle(s.to_string()))
    }
}

/// Where a style prompt comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    Preset(StylePreset),
    File(PathBuf),
}

impl StyleSource {
    pub fn resolve(&self, styles_dir: &Path) -> Result<PathBuf, IllustratorError> {
        match self {
            StyleSource::Preset(preset) => preset.resolve(styles_dir),
            StyleSource::File(path) if path.is_file() => Ok(path.clone()),
            StyleSource::File(path) => Err(IllustratorError::StyleFileNotFound(path.clone())),
        }
    }

    pub fn label(&self) -> String {
        match self {
            StyleSource::Preset(preset) => preset.display_name().to_string(),
            StyleSource::File(path) => path.display().to_string(),
        }
    }
}

static PROMPT_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)###?\s+(?:提示词|Prompt)(.+)").expect("prompt section pattern"));
static SKIPPED_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##?\s+(?:概述|适配模型|适用模型及软件|Overview|Compatible models)")
        .expect("skipped section pattern")
});
static ANY_SECTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^##?\s+").expect("section pattern"));

/// Trailing blocks that introduce the per-image content, not the style.
const END_MARKERS: &[&str] = &[
    "需要生成 PPT 的内容：",
    "需要生成 PPT 的内容:",
    "文本信息：",
    "文本信息:",
    "内容：",
    "内容:",
    "Content:",
];

const TEXT_INFO_MARKERS: &[&str] = &["文本信息：", "文本信息:"];

/// Pull the core prompt out of a style file.
///
/// 1. Text after a `##`/`###` prompt heading, cut at the first end marker.
/// 2. Files that are a prompt template as a whole (start with `帮我`/`基于`),
///    cut at the text-info marker.
/// 3. Otherwise the file minus overview/model-compatibility sections.
pub fn extract_core_prompt(content: &str) -> String {
    if let Some(caps) = PROMPT_SECTION.captures(content) {
        let extracted = caps[1].trim();
        return cut_at_first_marker(extracted, END_MARKERS).to_string();
    }

    if content.starts_with("帮我") || content.starts_with("基于") {
        return cut_at_first_marker(content, TEXT_INFO_MARKERS).to_string();
    }

    let mut kept = Vec::new();
    let mut skip = false;
    for line in content.split('\n') {
        if SKIPPED_SECTION.is_match(line) {
            skip = true;
            continue;
        } else if ANY_SECTION.is_match(line) {
            skip = false;
        }

        if !skip {
            kept.push(line);
        }
    }
    kept.join("\n").trim().to_string()
}

/// Cut at the first marker in list order that occurs in `text`.
fn cut_at_first_marker<'a>(text: &'a str, markers: &[&str]) -> &'a str {
    for marker in markers {
        if let Some(pos) = text.find(marker) {
            return text[..pos].trim();
        }
    }
    text.trim()
}

/// Read a style file and extract its core prompt.
pub fn load_style_prompt(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read style file: {}", path.display()))?;
    Ok(extract_core_prompt(&content))
}
