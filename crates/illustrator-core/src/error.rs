//! Domain errors for document structuring and style resolution.
//!
//! Command-level plumbing uses `anyhow`; these are the conditions callers are
//! expected to match on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IllustratorError {
    /// The document has no `##`, `###` or `####` heading.
    #[error("no headings (##, ###, ####) found in document; make sure it is markdown with section headings")]
    NoHeadingsFound,

    #[error("invalid target level '{0}'; expected one of h2, h3, h4")]
    InvalidTargetLevel(String),

    /// Merged output does not account for every original section exactly once.
    #[error("content coverage failed: {}", coverage_problems(.missing, .duplicated, .unknown))]
    CoverageFailure {
        missing: Vec<String>,
        duplicated: Vec<String>,
        unknown: Vec<String>,
    },

    #[error("unknown style '{0}'; expected one of gradient-glass, ticket, vector-illustration")]
    UnknownStyle(String),

    #[error("style file not found: {}", .0.display())]
    StyleFileNotFound(PathBuf),

    #[error("unsupported aspect ratio '{0}'; use 16:9 or 3:4")]
    InvalidAspectRatio(String),

    #[error("unsupported resolution '{0}'; use 2K or 4K")]
    InvalidResolution(String),

    /// A choice was left open and there is no terminal to ask on.
    #[error("no {0} selected; pass --{0} when not running interactively")]
    MissingSelection(&'static str),
}

fn coverage_problems(missing: &[String], duplicated: &[String], unknown: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("{} section(s) missing ({})", missing.len(), missing.join(", ")));
    }
    if !duplicated.is_empty() {
        parts.push(format!("{} section(s) merged more than once ({})", duplicated.len(), duplicated.join(", ")));
    }
    if !unknown.is_empty() {
        parts.push(format!("{} unknown section reference(s) ({})", unknown.len(), unknown.join(", ")));
    }
    parts.join("; ")
}
