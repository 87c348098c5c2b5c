// Fold sections deeper than the target level into their nearest preceding anchor

use crate::heading::{HeadingLevel, Section};
use serde::Serialize;
use tracing::debug;

/// Brackets around an absorbed section's title inside the anchor body.
pub const LABEL_OPEN: char = '【';
pub const LABEL_CLOSE: char = '】';

/// Reference to an original section by identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub index: usize,
    pub title: String,
}

impl SourceRef {
    fn of(section: &Section) -> Self {
        Self {
            index: section.index,
            title: section.title.clone(),
        }
    }
}

/// One unit of illustration: an anchor section plus everything folded into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedSection {
    /// Target level of the merge run.
    pub level: HeadingLevel,
    /// Heading level of the anchor itself. Differs from `level` for
    /// standalone shallower or orphaned deeper sections.
    pub anchor_level: HeadingLevel,
    pub title: String,
    pub body: String,
    /// Provenance, anchor first, then absorbed sections in document order.
    pub absorbed: Vec<SourceRef>,
}

impl MergedSection {
    fn from_section(section: &Section, target: HeadingLevel) -> Self {
        Self {
            level: target,
            anchor_level: section.level,
            title: section.title.clone(),
            body: section.body.clone(),
            absorbed: vec![SourceRef::of(section)],
        }
    }

    fn absorb(&mut self, section: &Section) {
        if !self.body.is_empty() {
            self.body.push_str("\n\n");
        }
        self.body.push_str(&labeled_body(section));
        self.absorbed.push(SourceRef::of(section));
    }

    pub fn absorbed_titles(&self) -> Vec<&str> {
        self.absorbed.iter().map(|r| r.title.as_str()).collect()
    }

    /// Absorbed sections other than the anchor.
    pub fn children(&self) -> &[SourceRef] {
        self.absorbed.get(1..).unwrap_or_default()
    }

    /// True when the anchor sits at the target level.
    pub fn is_anchor(&self) -> bool {
        self.anchor_level == self.level
    }
}

/// `【title】` followed by the section body on the next line.
pub fn labeled_body(section: &Section) -> String {
    format!("{LABEL_OPEN}{}{LABEL_CLOSE}\n{}", section.title, section.body)
}

/// Merge sections at `target` granularity in one left-to-right pass.
///
/// - a section at `target` closes the open anchor and opens a new one
/// - a deeper section is absorbed by the open anchor, or emitted on its own
///   when no anchor is open
/// - a shallower section closes the open anchor, is emitted on its own and
///   leaves no anchor open
pub fn merge_sections(sections: &[Section], target: HeadingLevel) -> Vec<MergedSection> {
    let mut merged = Vec::new();
    let mut anchor: Option<MergedSection> = None;

    for section in sections {
        match section.level.cmp(&target) {
            std::cmp::Ordering::Equal => {
                if let Some(done) = anchor.take() {
                    merged.push(done);
                }
                anchor = Some(MergedSection::from_section(section, target));
            }
            std::cmp::Ordering::Greater => match anchor.as_mut() {
                Some(open) => open.absorb(section),
                None => {
                    debug!(title = %section.title, "section precedes any {target} anchor; kept standalone");
                    merged.push(MergedSection::from_section(section, target));
                }
            },
            std::cmp::Ordering::Less => {
                if let Some(done) = anchor.take() {
                    merged.push(done);
                }
                merged.push(MergedSection::from_section(section, target));
            }
        }
    }

    if let Some(done) = anchor.take() {
        merged.push(done);
    }

    debug!(original = sections.len(), merged = merged.len(), %target, "merged sections");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::parse_document;

    fn titles(merged: &[MergedSection]) -> Vec<Vec<&str>> {
        merged.iter().map(|m| m.absorbed_titles()).collect()
    }

    #[test]
    fn test_merge_into_h2_parent() {
        let doc = parse_document("## A\na\n### A.1\none\n### A.2\ntwo\n## B\nb\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H2);

        assert_eq!(titles(&merged), vec![vec!["A", "A.1", "A.2"], vec!["B"]]);
        assert_eq!(merged[0].body, "a\n\n【A.1】\none\n\n【A.2】\ntwo");
        assert_eq!(merged[1].body, "b");
        assert!(merged.iter().all(|m| m.level == HeadingLevel::H2));
    }

    #[test]
    fn test_absorb_into_empty_anchor_body() {
        let doc = parse_document("## A\n### A.1\none\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H2);
        assert_eq!(merged[0].body, "【A.1】\none");
    }

    #[test]
    fn test_orphan_before_anchor_is_standalone() {
        let doc = parse_document("### X.1\norphan\n## X\nx\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H2);

        assert_eq!(titles(&merged), vec![vec!["X.1"], vec!["X"]]);
        assert_eq!(merged[0].anchor_level, HeadingLevel::H3);
        assert!(!merged[0].is_anchor());
        assert_eq!(merged[0].body, "orphan");
    }

    #[test]
    fn test_shallower_resets_anchor() {
        let doc = parse_document("## P\n### P.1\n#### P.1.a\n### P.2\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H3);
        assert_eq!(titles(&merged), vec![vec!["P"], vec!["P.1", "P.1.a"], vec!["P.2"]]);

        let doc = parse_document("### A\n#### A.a\n## B\n#### B.orphan\n### C\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H3);
        assert_eq!(
            titles(&merged),
            vec![vec!["A", "A.a"], vec!["B"], vec!["B.orphan"], vec!["C"]]
        );
    }

    #[test]
    fn test_children_excludes_anchor() {
        let doc = parse_document("## A\n### A.1\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H2);
        assert_eq!(merged[0].children().len(), 1);
        assert_eq!(merged[0].children()[0].title, "A.1");
    }

    #[test]
    fn test_duplicate_titles_kept_by_position() {
        let doc = parse_document("## A\n### Notes\nfirst\n## B\n### Notes\nsecond\n").unwrap();
        let merged = merge_sections(&doc.sections, HeadingLevel::H2);

        assert_eq!(merged[0].absorbed[1].index, 1);
        assert_eq!(merged[1].absorbed[1].index, 3);
        assert!(merged[0].body.contains("first"));
        assert!(merged[1].body.contains("second"));
    }
}
