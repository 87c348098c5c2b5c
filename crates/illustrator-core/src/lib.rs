pub mod config;
pub mod coverage;
pub mod error;
pub mod heading;
pub mod interactive;
pub mod merge;
pub mod model;
pub mod plan;
pub mod style;

use anyhow::{Context, Result};
use heading::{DocumentStructure, HeadingLevel};
use model::{AspectRatio, IllustratorConfig, RenderConfig, Resolution};
use plan::{IllustrationRenderer, PromptKind, RenderRequest, RenderSummary};
use std::fs;
use std::path::{Path, PathBuf};
use style::{StylePreset, StyleSource};
use tracing::info;

/// Opens a renderer once rendering is actually needed.
pub type Connect<'a> = dyn FnOnce(&RenderConfig) -> Result<Box<dyn IllustrationRenderer>> + 'a;

/// Options for `generate`; every `Some` overrides the loaded config.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub document: PathBuf,
    pub level: Option<String>,
    pub style: Option<String>,
    pub style_file: Option<PathBuf>,
    pub styles_dir: Option<PathBuf>,
    pub resolution: Option<String>,
    pub aspect_ratio: Option<String>,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

/// Options for `single`: one image from explicit title and content.
#[derive(Debug, Clone, Default)]
pub struct SingleOptions {
    pub title: String,
    pub content: String,
    pub style: Option<String>,
    pub style_file: Option<PathBuf>,
    pub styles_dir: Option<PathBuf>,
    pub resolution: Option<String>,
    pub aspect_ratio: Option<String>,
    pub output: PathBuf,
    pub cover: bool,
}

/// Illustrate every section of a document at the chosen granularity.
pub fn cmd_generate(
    config: &IllustratorConfig,
    opts: &GenerateOptions,
    connect: Box<Connect<'_>>,
) -> Result<RenderSummary> {
    use owo_colors::OwoColorize;

    interactive::print_header("Document illustrator");

    if opts.dry_run {
        println!("{} {}", "▸".bright_blue(), "Dry run mode - no images will be generated".bright_blue());
        println!();
    }

    interactive::print_section("📖", "Analysing document structure...");
    let text = read_document(&opts.document)?;
    let structure = heading::parse_document(&text)?;
    print_structure(&structure);

    let level = match opts.level.as_deref().or(config.defaults.level.as_deref()) {
        Some(raw) => {
            let level: HeadingLevel = raw.parse()?;
            interactive::print_info(&format!(
                "Granularity: {} ({} heading(s))",
                level,
                structure.count_at(level)
            ));
            level
        }
        None => interactive::prompt_level(&structure)?,
    };

    let source = select_style(config, opts.style.as_deref(), opts.style_file.as_deref())?;
    let styles_dir = styles_dir(config, opts.styles_dir.as_deref());
    let style_path = source.resolve(&styles_dir)?;
    let style_prompt = style::load_style_prompt(&style_path)?;
    interactive::print_success(&format!("Loaded style: {}", source.label()));
    let (preview, _) = plan::truncate_body(&style_prompt, 200);
    interactive::print_item(&format!("preview: {preview}"));

    let (aspect_ratio, resolution) =
        render_settings(&config.render, opts.aspect_ratio.as_deref(), opts.resolution.as_deref())?;

    let output_dir = output_dir(config, opts)?;
    println!();
    interactive::print_file("output", &output_dir.display().to_string());

    println!();
    interactive::print_section("📋", "Merging subsections...");
    let plan = plan::plan_structure(structure, level);
    interactive::print_item(&format!("original sections: {}", plan.structure.sections.len()));
    interactive::print_item(&format!("merged sections: {}", plan.merged.len()));

    println!();
    interactive::print_section("🔍", "Verifying content coverage...");
    plan.coverage.print();

    let jobs = match plan.render_jobs(config.render.max_body_chars) {
        Ok(jobs) => jobs,
        Err(e) => {
            interactive::print_error(&e.to_string());
            interactive::print_warning("Try a different granularity or check the document's heading levels");
            return Err(e.into());
        }
    };

    if opts.dry_run {
        println!();
        interactive::print_section("🖼", &format!("Would generate {} illustration(s):", jobs.len()));
        for job in &jobs {
            let note = if job.truncated { " (content truncated)" } else { "" };
            interactive::print_item(&format!("{}  {}{}", job.file_name, job.title, note));
        }
        println!();
        interactive::print_info("Run without --dry-run to generate images");
        return Ok(RenderSummary::default());
    }

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;
    let renderer = connect(&config.render)?;

    println!();
    interactive::print_section(
        "🖼",
        &format!("Generating {} illustration(s) at {} {}...", jobs.len(), resolution, aspect_ratio),
    );
    let total = jobs.len();
    let summary = plan::render_all(
        &jobs,
        &style_prompt,
        &output_dir,
        aspect_ratio,
        resolution,
        renderer.as_ref(),
        |job, result| {
            println!("{} [{}/{}] {}", "▸".bright_cyan(), job.index, total, job.title.bright_white());
            if job.truncated {
                interactive::print_item(&format!(
                    "content truncated to {} characters",
                    config.render.max_body_chars
                ));
            }
            match result {
                Ok(path) => interactive::print_file("saved", &path.display().to_string()),
                Err(e) => interactive::print_error(&format!("image {} failed: {:#}", job.index, e)),
            }
        },
    );

    println!();
    println!("{}", "━".repeat(60).bright_black());
    interactive::print_success(&format!("Generated: {}", summary.successful()));
    if !summary.failed.is_empty() {
        interactive::print_warning(&format!("Failed: {}", summary.failed.len()));
    }
    interactive::print_file("images in", &output_dir.display().to_string());
    info!(written = summary.successful(), failed = summary.failed.len(), "generation finished");

    Ok(summary)
}

/// Show structure, merged sections and coverage without rendering.
pub fn cmd_analyze(config: &IllustratorConfig, document: &Path, level: Option<&str>, json: bool) -> Result<()> {
    use owo_colors::OwoColorize;

    let text = read_document(document)?;
    let level: HeadingLevel = match level.or(config.defaults.level.as_deref()) {
        Some(raw) => raw.parse()?,
        None => HeadingLevel::H2,
    };
    let plan = plan::plan_document(&text, level)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!();
        println!("{} {}", "▸".bright_cyan(), "Document structure".bright_cyan().bold());
        println!();
        print_structure(&plan.structure);

        println!();
        interactive::print_section("📋", &format!("Merged at {} ({} section(s))", level, plan.merged.len()));
        for (i, section) in plan.merged.iter().enumerate() {
            let marker = if section.is_anchor() { "•" } else { "◦" };
            println!(
                "   {} {:02} {} {}",
                marker.bright_black(),
                i + 1,
                section.title.bright_white(),
                format!("[{}]", section.absorbed_titles().join(", ")).bright_black()
            );
        }

        println!();
        interactive::print_section("🔍", "Coverage");
        plan.coverage.print();
    }

    plan.coverage.ensure_covered()?;
    Ok(())
}

/// Generate one image from explicit title and content.
pub fn cmd_single(config: &IllustratorConfig, opts: &SingleOptions, connect: Box<Connect<'_>>) -> Result<PathBuf> {
    let source = select_style(config, opts.style.as_deref(), opts.style_file.as_deref())?;
    let style_path = source.resolve(&styles_dir(config, opts.styles_dir.as_deref()))?;
    let style_prompt = style::load_style_prompt(&style_path)?;
    let (aspect_ratio, resolution) =
        render_settings(&config.render, opts.aspect_ratio.as_deref(), opts.resolution.as_deref())?;

    let kind = if opts.cover { PromptKind::Cover } else { PromptKind::Content };
    let prompt = plan::compose_prompt(&style_prompt, &opts.title, &opts.content, kind);

    if let Some(parent) = opts.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
    }

    interactive::print_info(&format!("Generating {} image: {}", if opts.cover { "cover" } else { "content" }, opts.title));
    let renderer = connect(&config.render)?;
    let path = renderer.render(&RenderRequest {
        prompt: &prompt,
        output_path: &opts.output,
        aspect_ratio,
        resolution,
    })?;
    interactive::print_file("saved", &path.display().to_string());
    Ok(path)
}

/// List style presets and whether their files are present.
pub fn cmd_styles(config: &IllustratorConfig, styles_dir_override: Option<&Path>) -> Result<()> {
    use owo_colors::OwoColorize;

    let dir = styles_dir(config, styles_dir_override);
    println!();
    println!("{} {} {}", "▸".bright_cyan(), "Styles in".bright_cyan().bold(), dir.display());
    println!();
    for preset in StylePreset::ALL {
        let status = if preset.resolve(&dir).is_ok() {
            "✓".bright_green().to_string()
        } else {
            "✗".bright_red().to_string()
        };
        println!(
            "   {} {:<20} {}",
            status,
            preset.slug().bright_white(),
            format!("{} - {}", preset.display_name(), preset.description()).bright_black()
        );
    }
    println!();
    Ok(())
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read document: {}", path.display()))
}

fn print_structure(structure: &DocumentStructure) {
    use comfy_table::presets::UTF8_FULL;
    use comfy_table::{Cell, Row, Table};

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Level", "Marker", "Headings"]);

    for level in HeadingLevel::ALL {
        table.add_row(Row::from(vec![
            Cell::new(level.as_str()).fg(comfy_table::Color::Cyan),
            Cell::new(level.marker()),
            Cell::new(structure.count_at(level)).fg(comfy_table::Color::White),
        ]));
    }

    println!("{table}");
}

/// `--style-file` beats `--style`, which beats the configured default;
/// with none of them the operator is asked.
fn select_style(config: &IllustratorConfig, style: Option<&str>, style_file: Option<&Path>) -> Result<StyleSource> {
    if let Some(path) = style_file {
        return Ok(StyleSource::File(path.to_path_buf()));
    }
    match style.or(config.defaults.style.as_deref()) {
        Some(name) => Ok(StyleSource::Preset(name.parse()?)),
        None => Ok(StyleSource::Preset(interactive::prompt_style()?)),
    }
}

fn styles_dir(config: &IllustratorConfig, overridden: Option<&Path>) -> PathBuf {
    overridden
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.paths.styles_dir))
}

fn render_settings(
    render: &RenderConfig,
    aspect_ratio: Option<&str>,
    resolution: Option<&str>,
) -> Result<(AspectRatio, Resolution)> {
    let aspect_ratio = match aspect_ratio {
        Some(raw) => raw.parse()?,
        None => render.aspect_ratio,
    };
    let resolution = match resolution {
        Some(raw) => raw.parse()?,
        None => render.resolution,
    };
    Ok((aspect_ratio, resolution))
}

/// `--output`, then `paths.outputDir`, then `images/` next to the document.
fn output_dir(config: &IllustratorConfig, opts: &GenerateOptions) -> Result<PathBuf> {
    if let Some(dir) = &opts.output {
        return Ok(dir.clone());
    }
    if let Some(dir) = &config.paths.output_dir {
        return Ok(PathBuf::from(dir));
    }
    let absolute = std::path::absolute(&opts.document)
        .with_context(|| format!("Failed to resolve document path: {}", opts.document.display()))?;
    let doc_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(doc_dir.join("images"))
}
