//! Heading tokenizer: splits a markdown document into level-2..4 sections.
//!
//! Only `##`, `###` and `####` headings open a section. A single `#` line is
//! the document title and text before the first section heading is ignored.

use crate::error::IllustratorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Heading rank. `H2` is the shallowest, `H4` the deepest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub const ALL: [HeadingLevel; 3] = [HeadingLevel::H2, HeadingLevel::H3, HeadingLevel::H4];

    /// Map a run of `#` markers to a level. Only 2..=4 markers qualify.
    pub fn from_marker_count(count: usize) -> Option<Self> {
        match count {
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            4 => Some(HeadingLevel::H4),
            _ => None,
        }
    }

    pub fn depth(self) -> usize {
        match self {
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "##",
            HeadingLevel::H3 => "###",
            HeadingLevel::H4 => "####",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
        }
    }

    /// Human label for granularity menus.
    pub fn granularity(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "coarse",
            HeadingLevel::H3 => "medium",
            HeadingLevel::H4 => "fine",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeadingLevel {
    type Err = IllustratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h2" | "2" | "##" => Ok(HeadingLevel::H2),
            "h3" | "3" | "###" => Ok(HeadingLevel::H3),
            "h4" | "4" | "####" => Ok(HeadingLevel::H4),
            _ => Err(IllustratorError::InvalidTargetLevel(s.to_string())),
        }
    }
}

/// One heading and the text up to the next recognised heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Position in the document's section sequence; the section's identity.
    pub index: usize,
    /// 0-based source line of the heading.
    pub line: usize,
    pub level: HeadingLevel,
    pub title: String,
    /// Body text, trimmed at both ends only.
    pub body: String,
}

/// Parsed document: the ordered sections plus per-level groupings.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStructure {
    pub sections: Vec<Section>,
}

impl DocumentStructure {
    /// Titles of all headings at `level`, in document order.
    pub fn titles_at(&self, level: HeadingLevel) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| s.level == level)
            .map(|s| s.title.as_str())
            .collect()
    }

    pub fn count_at(&self, level: HeadingLevel) -> usize {
        self.sections.iter().filter(|s| s.level == level).count()
    }

    /// Levels that have at least one heading, shallowest first.
    pub fn levels_present(&self) -> Vec<HeadingLevel> {
        HeadingLevel::ALL
            .into_iter()
            .filter(|level| self.count_at(*level) > 0)
            .collect()
    }
}

/// Recognise a section heading line, returning its level and trimmed title.
///
/// The line must start with 2..=4 `#` markers followed by whitespace and a
/// non-empty title. `#####` and deeper are body text.
pub fn parse_heading_line(line: &str) -> Option<(HeadingLevel, &str)> {
    let markers = line.bytes().take_while(|b| *b == b'#').count();
    let level = HeadingLevel::from_marker_count(markers)?;

    let rest = &line[markers..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some((level, title))
}

/// Split document text into sections in a single pass.
pub fn parse_document(text: &str) -> Result<DocumentStructure, IllustratorError> {
    let mut sections = Vec::new();
    let mut current: Option<(usize, HeadingLevel, String)> = None;
    let mut body_lines: Vec<&str> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if let Some((level, title)) = parse_heading_line(line) {
            if let Some((start, lvl, t)) = current.take() {
                sections.push(close_section(sections.len(), start, lvl, t, &body_lines));
            }
            body_lines.clear();
            current = Some((line_no, level, title.to_string()));
        } else if current.is_some() {
            body_lines.push(line);
        }
    }

    if let Some((start, lvl, t)) = current.take() {
        sections.push(close_section(sections.len(), start, lvl, t, &body_lines));
    }

    if sections.is_empty() {
        return Err(IllustratorError::NoHeadingsFound);
    }

    debug!(sections = sections.len(), "parsed document structure");
    Ok(DocumentStructure { sections })
}

fn close_section(index: usize, line: usize, level: HeadingLevel, title: String, body: &[&str]) -> Section {
    Section {
        index,
        line,
        level,
        title,
        body: body.join("\n").trim().to_string(),
    }
}
