//! Content coverage verification.
//!
//! Cross-checks merged sections against the original section list. Sections
//! are matched by position and title, so two sections sharing a title are
//! still tracked separately. Every original section must appear in exactly
//! one merged record, and every reference must name a real section.

use crate::error::IllustratorError;
use crate::heading::Section;
use crate::merge::{MergedSection, SourceRef};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoverageStatus {
    /// Stands alone; absorbed nothing.
    #[serde(rename = "independent")]
    Independent,
    /// Anchor that absorbed at least one section.
    #[serde(rename = "parent")]
    Parent,
    /// Folded into another record.
    #[serde(rename = "merged")]
    Merged,
    #[serde(rename = "MISSING")]
    Missing,
    /// Already placed in an earlier record.
    #[serde(rename = "DUPLICATE")]
    Duplicate,
    /// Reference that matches no original section by index and title.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl CoverageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverageStatus::Independent => "independent",
            CoverageStatus::Parent => "parent",
            CoverageStatus::Merged => "merged",
            CoverageStatus::Missing => "MISSING",
            CoverageStatus::Duplicate => "DUPLICATE",
            CoverageStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageEntry {
    pub index: usize,
    pub title: String,
    pub status: CoverageStatus,
    /// Anchor title for `Merged` and `Duplicate` entries.
    pub merged_into: Option<String>,
    /// Number of absorbed children for `Parent` entries.
    pub children: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub original_count: usize,
    pub merged_count: usize,
    pub missing_count: usize,
    /// Extra appearances of sections already placed in another record.
    pub duplicate_count: usize,
    /// References that match no original section.
    pub unknown_count: usize,
    pub entries: Vec<CoverageEntry>,
}

impl CoverageReport {
    /// Every original section appears exactly once and nothing else does.
    pub fn all_covered(&self) -> bool {
        self.missing_count == 0 && self.duplicate_count == 0 && self.unknown_count == 0
    }

    pub fn missing_titles(&self) -> Vec<&str> {
        self.titles_with(CoverageStatus::Missing)
    }

    pub fn duplicate_titles(&self) -> Vec<&str> {
        self.titles_with(CoverageStatus::Duplicate)
    }

    pub fn unknown_titles(&self) -> Vec<&str> {
        self.titles_with(CoverageStatus::Unknown)
    }

    fn titles_with(&self, status: CoverageStatus) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.title.as_str())
            .collect()
    }

    /// Gate for downstream rendering.
    pub fn ensure_covered(&self) -> Result<(), IllustratorError> {
        if self.all_covered() {
            return Ok(());
        }
        let owned = |titles: Vec<&str>| titles.into_iter().map(str::to_string).collect();
        Err(IllustratorError::CoverageFailure {
            missing: owned(self.missing_titles()),
            duplicated: owned(self.duplicate_titles()),
            unknown: owned(self.unknown_titles()),
        })
    }

    /// Plain-text report, one line per entry.
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "coverage: {} original -> {} merged, {} missing",
            self.original_count, self.merged_count, self.missing_count
        );
        if self.duplicate_count > 0 || self.unknown_count > 0 {
            let _ = writeln!(
                out,
                "  ({} duplicate, {} unknown reference(s))",
                self.duplicate_count, self.unknown_count
            );
        }
        for entry in &self.entries {
            let _ = write!(out, "  {:<11} {}", entry.status.as_str(), entry.title);
            match entry.status {
                CoverageStatus::Parent => {
                    let _ = write!(out, " (+{})", entry.children);
                }
                CoverageStatus::Merged | CoverageStatus::Duplicate => {
                    if let Some(ref anchor) = entry.merged_into {
                        let _ = write!(out, " -> {anchor}");
                    }
                }
                _ => {}
            }
            out.push('\n');
        }
        out
    }

    pub fn print(&self) {
        for entry in &self.entries {
            match entry.status {
                CoverageStatus::Missing => {
                    println!("  {} missing: {}", "▸".bright_yellow(), entry.title.yellow().bold());
                }
                CoverageStatus::Duplicate => {
                    let anchor = entry.merged_into.as_deref().unwrap_or("?");
                    println!(
                        "  {} duplicate: {} {} {}",
                        "▸".bright_yellow(),
                        entry.title.yellow().bold(),
                        "→".bright_black(),
                        anchor.yellow()
                    );
                }
                CoverageStatus::Unknown => {
                    println!(
                        "  {} unknown: {} {}",
                        "▸".bright_yellow(),
                        entry.title.yellow().bold(),
                        format!("(index {})", entry.index).bright_black()
                    );
                }
                CoverageStatus::Merged => {
                    let anchor = entry.merged_into.as_deref().unwrap_or("?");
                    println!(
                        "  {} merged: {} {} {}",
                        "✓".bright_green(),
                        entry.title.bright_white(),
                        "→".bright_black(),
                        anchor.bright_white()
                    );
                }
                CoverageStatus::Parent => {
                    println!(
                        "  {} parent: {} {}",
                        "✓".bright_green(),
                        entry.title.bright_white().bold(),
                        format!("(includes {} subsection(s))", entry.children).bright_black()
                    );
                }
                CoverageStatus::Independent => {
                    println!("  {} independent: {}", "✓".bright_green(), entry.title.bright_white());
                }
            }
        }

        println!("{}", "─".repeat(60).bright_black());
        let mut summary = format!(
            "{} original, {} merged, {} missing",
            self.original_count, self.merged_count, self.missing_count
        );
        if self.duplicate_count > 0 || self.unknown_count > 0 {
            summary.push_str(&format!(
                ", {} duplicate, {} unknown",
                self.duplicate_count, self.unknown_count
            ));
        }
        if self.all_covered() {
            println!("{} {}", "✓".bright_green(), summary.green());
        } else {
            println!("{} {}", "✗".bright_red(), summary.red().bold());
        }
    }
}

/// Verify that every original section is accounted for exactly once in `merged`.
///
/// Entries are listed in merged order; missing sections follow in
/// document order.
pub fn verify_coverage(original: &[Section], merged: &[MergedSection]) -> CoverageReport {
    let mut seen: HashMap<usize, usize> = HashMap::new();
    let mut entries = Vec::new();
    let mut duplicate_count = 0;
    let mut unknown_count = 0;

    for record in merged {
        let Some((anchor, children)) = record.absorbed.split_first() else {
            continue;
        };

        let mut classify = |source: &SourceRef, placed: CoverageStatus| {
            let known = original
                .get(source.index)
                .is_some_and(|s| s.title == source.title);
            if !known {
                unknown_count += 1;
                return CoverageStatus::Unknown;
            }
            let count = seen.entry(source.index).or_insert(0);
            *count += 1;
            if *count > 1 {
                duplicate_count += 1;
                return CoverageStatus::Duplicate;
            }
            placed
        };

        let anchor_status = if children.is_empty() {
            CoverageStatus::Independent
        } else {
            CoverageStatus::Parent
        };
        entries.push(CoverageEntry {
            index: anchor.index,
            title: anchor.title.clone(),
            status: classify(anchor, anchor_status),
            merged_into: None,
            children: children.len(),
        });

        for child in children {
            entries.push(CoverageEntry {
                index: child.index,
                title: child.title.clone(),
                status: classify(child, CoverageStatus::Merged),
                merged_into: Some(anchor.title.clone()),
                children: 0,
            });
        }
    }

    let mut missing_count = 0;
    for section in original.iter().filter(|s| !seen.contains_key(&s.index)) {
        missing_count += 1;
        entries.push(CoverageEntry {
            index: section.index,
            title: section.title.clone(),
            status: CoverageStatus::Missing,
            merged_into: None,
            children: 0,
        });
    }

    debug!(
        original = original.len(),
        merged = merged.len(),
        missing_count,
        duplicate_count,
        unknown_count,
        "verified coverage"
    );
    CoverageReport {
        original_count: original.len(),
        merged_count: merged.len(),
        missing_count,
        duplicate_count,
        unknown_count,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::{parse_document, HeadingLevel};
    use crate::merge::merge_sections;

    #[test]
    fn test_statuses_for_parent_and_children() {
        let doc = parse_document("## A\n### A.1\n### A.2\n## B\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H2);
        let report = verify_coverage(&doc.sections, &merged);

        let statuses: Vec<_> = report.entries.iter().map(|e| (e.title.as_str(), e.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("A", CoverageStatus::Parent),
                ("A.1", CoverageStatus::Merged),
                ("A.2", CoverageStatus::Merged),
                ("B", CoverageStatus::Independent),
            ]
        );
        assert_eq!(report.entries[0].children, 2);
        assert_eq!(report.entries[1].merged_into.as_deref(), Some("A"));
        assert!(report.all_covered());
        assert!(report.ensure_covered().is_ok());
    }

    #[test]
    fn test_dropped_section_is_missing() {
        let doc = parse_document("## A\n### A.1\n## B\n").unwrap();
        let mut merged = merge_sections(&doc.sections, HeadingLevel::H2);
        merged.pop();

        let report = verify_coverage(&doc.sections, &merged);
        assert!(!report.all_covered());
        assert_eq!(report.missing_count, 1);
        assert_eq!(report.missing_titles(), vec!["B"]);

        let err = report.ensure_covered().unwrap_err();
        assert!(matches!(err, IllustratorError::CoverageFailure { ref missing, .. } if missing == &vec!["B".to_string()]));
    }

    #[test]
    fn test_duplicate_title_does_not_mask_drop() {
        // Both subsections are titled "Notes"; dropping one must still be reported.
        let doc = parse_document("## A\n### Notes\n## B\n### Notes\n").unwrap();
        let mut merged = merge_sections(&doc.sections, HeadingLevel::H2);
        merged[1].absorbed.truncate(1);

        let report = verify_coverage(&doc.sections, &merged);
        assert_eq!(report.missing_count, 1);
        let missing: Vec<_> = report
            .entries
            .iter()
            .filter(|e| e.status == CoverageStatus::Missing)
            .map(|e| e.index)
            .collect();
        assert_eq!(missing, vec![3]);
    }

    #[test]
    fn test_tampered_index_is_not_counted() {
        let doc = parse_document("## A\n## B\n").unwrap();
        let mut merged = merge_sections(&doc.sections, HeadingLevel::H2);
        merged[1].absorbed[0].title = "Renamed".to_string();

        let report = verify_coverage(&doc.sections, &merged);
        assert_eq!(report.missing_titles(), vec!["B"]);
        assert_eq!(report.unknown_titles(), vec!["Renamed"]);
    }

    #[test]
    fn test_section_in_two_records_is_duplicate() {
        let doc = parse_document("## A\n### A.1\n## B\n").unwrap();
        let mut merged = merge_sections(&doc.sections, HeadingLevel::H2);
        let stray = merged[0].absorbed[1].clone();
        merged[1].absorbed.push(stray);

        let report = verify_coverage(&doc.sections, &merged);
        assert_eq!(report.missing_count, 0);
        assert_eq!(report.duplicate_count, 1);
        assert!(!report.all_covered());

        let duplicate = report
            .entries
            .iter()
            .find(|e| e.status == CoverageStatus::Duplicate)
            .unwrap();
        assert_eq!((duplicate.index, duplicate.merged_into.as_deref()), (1, Some("B")));

        let err = report.ensure_covered().unwrap_err();
        assert!(matches!(
            err,
            IllustratorError::CoverageFailure { ref duplicated, .. } if duplicated == &vec!["A.1".to_string()]
        ));
    }

    #[test]
    fn test_reference_to_nonexistent_section_is_unknown() {
        let doc = parse_document("## A\n## B\n").unwrap();
        let mut merged = merge_sections(&doc.sections, HeadingLevel::H2);
        merged[1].absorbed[0].index = 99;

        let report = verify_coverage(&doc.sections, &merged);
        let statuses: Vec<_> = report
            .entries
            .iter()
            .map(|e| (e.index, e.title.as_str(), e.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (0, "A", CoverageStatus::Independent),
                (99, "B", CoverageStatus::Unknown),
                (1, "B", CoverageStatus::Missing),
            ]
        );
        assert_eq!(report.unknown_count, 1);
        assert_eq!(report.missing_count, 1);
        assert!(report.ensure_covered().is_err());
    }

    #[test]
    fn test_render_plain_report() {
        let doc = parse_document("## A\n### A.1\n### A.2\n## B\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H2);
        let report = verify_coverage(&doc.sections, &merged);

        insta::assert_snapshot!(report.render_plain(), @r"
        coverage: 4 original -> 2 merged, 0 missing
          parent      A (+2)
          merged      A.1 -> A
          merged      A.2 -> A
          independent B
        ");
    }
}
