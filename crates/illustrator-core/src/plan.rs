//! From a verified merge to a sequence of render jobs.
//!
//! Jobs are only reachable through [`IllustrationPlan::render_jobs`], which
//! refuses to hand anything out when coverage verification failed.

use crate::coverage::{verify_coverage, CoverageReport};
use crate::error::IllustratorError;
use crate::heading::{parse_document, DocumentStructure, HeadingLevel};
use crate::merge::{merge_sections, MergedSection};
use crate::model::{AspectRatio, Resolution};
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parsed, merged and verified document.
#[derive(Debug, Clone, Serialize)]
pub struct IllustrationPlan {
    pub level: HeadingLevel,
    pub structure: DocumentStructure,
    pub merged: Vec<MergedSection>,
    pub coverage: CoverageReport,
}

impl IllustrationPlan {
    /// Numbered jobs in merged order, or `CoverageFailure` if any section
    /// went missing.
    pub fn render_jobs(&self, max_body_chars: usize) -> Result<Vec<RenderJob>, IllustratorError> {
        self.coverage.ensure_covered()?;
        Ok(self
            .merged
            .iter()
            .enumerate()
            .map(|(i, section)| RenderJob::new(i + 1, section, max_body_chars))
            .collect())
    }
}

/// Parse `text`, merge at `level` and verify coverage.
///
/// Fails only when the document has no section headings; a coverage gap is
/// recorded in the plan's report and enforced by `render_jobs`.
pub fn plan_document(text: &str, level: HeadingLevel) -> Result<IllustrationPlan, IllustratorError> {
    Ok(plan_structure(parse_document(text)?, level))
}

/// Merge an already parsed document at `level` and verify coverage.
pub fn plan_structure(structure: DocumentStructure, level: HeadingLevel) -> IllustrationPlan {
    let merged = merge_sections(&structure.sections, level);
    let coverage = verify_coverage(&structure.sections, &merged);
    if !coverage.all_covered() {
        warn!(
            missing = coverage.missing_count,
            duplicate = coverage.duplicate_count,
            unknown = coverage.unknown_count,
            "merged output does not cover every section exactly once"
        );
    }

    IllustrationPlan {
        level,
        structure,
        merged,
        coverage,
    }
}

/// One image to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    /// 1-based position in the merged sequence.
    pub index: usize,
    pub title: String,
    pub body: String,
    pub truncated: bool,
    pub file_name: String,
}

impl RenderJob {
    pub fn new(index: usize, section: &MergedSection, max_body_chars: usize) -> Self {
        let (body, truncated) = truncate_body(&section.body, max_body_chars);
        Self {
            index,
            title: section.title.clone(),
            body,
            truncated,
            file_name: artifact_name(index),
        }
    }
}

pub fn artifact_name(index: usize) -> String {
    format!("illustration-{index:02}.png")
}

/// Cap `body` at `max_chars` characters, appending `...` when cut.
pub fn truncate_body(body: &str, max_chars: usize) -> (String, bool) {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => (format!("{}...", &body[..cut]), true),
        None => (body.to_string(), false),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Content,
    /// Summarises a whole document in one image.
    Cover,
}

/// Frame a section for the image model. The framing is Chinese to match the
/// style prompts it wraps.
pub fn compose_prompt(style_prompt: &str, title: &str, content: &str, kind: PromptKind) -> String {
    match kind {
        PromptKind::Content => format!(
            "{style_prompt}\n\n根据以下内容生成配图：\n\n标题：{title}\n\n内容：\n{content}\n"
        ),
        PromptKind::Cover => format!(
            "{style_prompt}\n\n这是一张封面图，需要概括整个文档的核心信息。\n\n\
             标题：{title}\n\n核心内容（需要在一张图中体现）：\n{content}\n\n\
             要求：\n\
             - 封面图需要突出主题，具有引导性\n\
             - 信息要精炼但完整，能代表整个系列\n\
             - 视觉冲击力强，吸引读者注意\n"
        ),
    }
}

/// Everything a renderer needs for one image.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub prompt: &'a str,
    pub output_path: &'a Path,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

/// External image generator. Called once per job, sequentially.
pub trait IllustrationRenderer {
    /// Generate one image and write it to `request.output_path`.
    fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub written: Vec<PathBuf>,
    /// `(job index, error message)`
    pub failed: Vec<(usize, String)>,
}

impl RenderSummary {
    pub fn successful(&self) -> usize {
        self.written.len()
    }
}

/// Render every job in order. A failed image is recorded and the rest continue.
pub fn render_all<F>(
    jobs: &[RenderJob],
    style_prompt: &str,
    output_dir: &Path,
    aspect_ratio: AspectRatio,
    resolution: Resolution,
    renderer: &dyn IllustrationRenderer,
    mut on_result: F,
) -> RenderSummary
where
    F: FnMut(&RenderJob, &Result<PathBuf>),
{
    let mut summary = RenderSummary::default();

    for job in jobs {
        let prompt = compose_prompt(style_prompt, &job.title, &job.body, PromptKind::Content);
        let output_path = output_dir.join(&job.file_name);
        let request = RenderRequest {
            prompt: &prompt,
            output_path: &output_path,
            aspect_ratio,
            resolution,
        };

        debug!(index = job.index, title = %job.title, "rendering illustration");
        let result = renderer.render(&request);
        on_result(job, &result);

        match result {
            Ok(path) => summary.written.push(path),
            Err(e) => summary.failed.push((job.index, format!("{:#}", e))),
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let (body, cut) = truncate_body("配图生成器", 3);
        assert_eq!(body, "配图生...");
        assert!(cut);

        let (body, cut) = truncate_body("short", 5);
        assert_eq!(body, "short");
        assert!(!cut);
    }

    #[test]
    fn test_artifact_names_are_zero_padded() {
        assert_eq!(artifact_name(1), "illustration-01.png");
        assert_eq!(artifact_name(12), "illustration-12.png");
        assert_eq!(artifact_name(100), "illustration-100.png");
    }

    #[test]
    fn test_jobs_numbered_in_merged_order() {
        let plan = plan_document("## A\n### A.1\n## B\n## C\n", HeadingLevel::H2).unwrap();
        let jobs = plan.render_jobs(1000).unwrap();
        let numbered: Vec<_> = jobs.iter().map(|j| (j.index, j.title.as_str())).collect();
        assert_eq!(numbered, vec![(1, "A"), (2, "B"), (3, "C")]);
    }

    #[test]
    fn test_plan_structure_reuses_parsed_document() {
        let text = "## A\n### A.1\n## B\n";
        let structure = parse_document(text).unwrap();
        let plan = plan_structure(structure.clone(), HeadingLevel::H2);

        assert_eq!(plan.structure.sections, structure.sections);
        assert_eq!(plan.merged, plan_document(text, HeadingLevel::H2).unwrap().merged);
        assert!(plan.coverage.all_covered());
    }

    #[test]
    fn test_render_jobs_blocked_on_coverage_gap() {
        let mut plan = plan_document("## A\n## B\n", HeadingLevel::H2).unwrap();
        plan.merged.pop();
        plan.coverage = verify_coverage(&plan.structure.sections, &plan.merged);

        let err = plan.render_jobs(1000).unwrap_err();
        assert!(matches!(err, IllustratorError::CoverageFailure { .. }));
    }

    #[test]
    fn test_render_jobs_blocked_on_double_absorption() {
        let mut plan = plan_document("## A\n### A.1\n## B\n", HeadingLevel::H2).unwrap();
        let stray = plan.merged[0].absorbed[1].clone();
        plan.merged[1].absorbed.push(stray);
        plan.coverage = verify_coverage(&plan.structure.sections, &plan.merged);

        let err = plan.render_jobs(1000).unwrap_err();
        assert!(matches!(err, IllustratorError::CoverageFailure { ref duplicated, .. } if !duplicated.is_empty()));
    }

    #[test]
    fn test_content_prompt_layout() {
        let prompt = compose_prompt("STYLE", "Intro", "Body text", PromptKind::Content);
        assert_eq!(
            prompt,
            "STYLE\n\n根据以下内容生成配图：\n\n标题：Intro\n\n内容：\nBody text\n"
        );

        let cover = compose_prompt("STYLE", "Book", "Summary", PromptKind::Cover);
        assert!(cover.starts_with("STYLE\n\n这是一张封面图"));
        assert!(cover.contains("标题：Book\n\n核心内容（需要在一张图中体现）：\nSummary\n\n要求：\n"));
        assert!(cover.ends_with("- 视觉冲击力强，吸引读者注意\n"));
    }

    struct FlakyRenderer {
        calls: RefCell<Vec<String>>,
    }

    impl IllustrationRenderer for FlakyRenderer {
        fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf> {
            let name = request
                .output_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.calls.borrow_mut().push(name.clone());
            if name == "illustration-02.png" {
                anyhow::bail!("no image data");
            }
            Ok(request.output_path.to_path_buf())
        }
    }

    #[test]
    fn test_render_all_continues_after_failure() {
        let plan = plan_document("## A\n## B\n## C\n", HeadingLevel::H2).unwrap();
        let jobs = plan.render_jobs(1000).unwrap();
        let renderer = FlakyRenderer { calls: RefCell::new(Vec::new()) };
        let mut seen = 0;

        let summary = render_all(
            &jobs,
            "STYLE",
            Path::new("out"),
            AspectRatio::Wide,
            Resolution::TwoK,
            &renderer,
            |_, _| seen += 1,
        );

        assert_eq!(seen, 3);
        assert_eq!(summary.successful(), 2);
        assert_eq!(summary.failed, vec![(2, "no image data".to_string())]);
        assert_eq!(
            renderer.calls.into_inner(),
            vec!["illustration-01.png", "illustration-02.png", "illustration-03.png"]
        );
    }
}
