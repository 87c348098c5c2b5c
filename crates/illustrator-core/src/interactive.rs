// Interactive prompts and CLI output

use crate::error::IllustratorError;
use crate::heading::{DocumentStructure, HeadingLevel};
use crate::style::StylePreset;
use anyhow::Result;
use inquire::Select;
use owo_colors::OwoColorize;
use std::fmt;
use std::io::IsTerminal;

/// Check if we should use interactive mode
pub fn is_interactive() -> bool {
    // Never be interactive in test environment or CI
    if is_test_env() || is_ci() {
        return false;
    }

    std::io::stdin().is_terminal()
}

/// Check if running in CI environment
fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
}

/// Compile-time test flag or ILLUSTRATOR_TEST in the environment.
fn is_test_env() -> bool {
    cfg!(test) || std::env::var("ILLUSTRATOR_TEST").is_ok()
}

/// Menu entry for a granularity choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOption {
    pub level: HeadingLevel,
    pub images: usize,
}

impl fmt::Display for LevelOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - by {} headings ({}) - {} image(s)",
            self.level.granularity(),
            self.level,
            self.level.marker(),
            self.images
        )
    }
}

/// Granularity choices: only levels the document actually uses.
pub fn level_options(structure: &DocumentStructure) -> Vec<LevelOption> {
    structure
        .levels_present()
        .into_iter()
        .map(|level| LevelOption {
            level,
            images: structure.count_at(level),
        })
        .collect()
}

/// Ask for a granularity, or fail when there is no terminal to ask on.
pub fn prompt_level(structure: &DocumentStructure) -> Result<HeadingLevel> {
    if !is_interactive() {
        return Err(IllustratorError::MissingSelection("level").into());
    }
    let choice = Select::new("Choose a granularity:", level_options(structure)).prompt()?;
    Ok(choice.level)
}

/// Ask for a style preset, or fail when there is no terminal to ask on.
pub fn prompt_style() -> Result<StylePreset> {
    if !is_interactive() {
        return Err(IllustratorError::MissingSelection("style").into());
    }
    Ok(Select::new("Choose an illustration style:", StylePreset::ALL.to_vec()).prompt()?)
}

/// Print a header with decoration
pub fn print_header(text: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!("{}", text.bright_cyan().bold());
    println!("{}", "━".repeat(60).bright_black());
    println!();
}

/// Print a section header
pub fn print_section(emoji: &str, text: &str) {
    println!("{} {}", emoji, text.bright_white().bold());
}

/// Print success message
pub fn print_success(text: &str) {
    println!("{} {}", "✓".bright_green(), text.green());
}

/// Print info message
pub fn print_info(text: &str) {
    println!("{} {}", "→".bright_blue(), text.bright_blue());
}

/// Print warning message
pub fn print_warning(text: &str) {
    println!("{} {}", "▸ ".bright_yellow(), text.yellow());
}

/// Print error message
pub fn print_error(text: &str) {
    eprintln!("{} {}", "✗".bright_red(), text.red());
}

/// Print a list item
pub fn print_item(text: &str) {
    println!("   {} {}", "•".bright_black(), text);
}

/// Print a file path
pub fn print_file(prefix: &str, path: &str) {
    println!("   {} {}", prefix.green(), path.bright_white());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::parse_document;

    #[test]
    fn test_is_not_interactive_in_tests() {
        assert!(!is_interactive(), "is_interactive() should return false during tests");
    }

    #[test]
    fn test_level_options_skip_unused_levels() {
        let structure = parse_document("## A\n#### A.a\n#### A.b\n## B\n").unwrap();
        let options = level_options(&structure);
        assert_eq!(
            options,
            vec![
                LevelOption { level: HeadingLevel::H2, images: 2 },
                LevelOption { level: HeadingLevel::H4, images: 2 },
            ]
        );
        assert_eq!(options[0].to_string(), "coarse - by h2 headings (##) - 2 image(s)");
    }

    #[test]
    fn test_prompts_fail_without_terminal() {
        let structure = parse_document("## A\n").unwrap();
        let err = prompt_level(&structure).unwrap_err();
        assert!(err.to_string().contains("--level"));
        assert!(prompt_style().unwrap_err().to_string().contains("--style"));
    }
}
