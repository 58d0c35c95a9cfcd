use crate::level::{ProvisionLevel, RefType, SourceFormat};
use serde::{Deserialize, Serialize};

/// An outgoing cross-reference captured from inline link-like constructs in
/// a provision's own text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub target: String,
    pub display_text: String,
    pub ref_type: RefType,
    pub target_title: Option<String>,
    pub target_section: Option<String>,
}

impl Reference {
    pub fn new(target: impl Into<String>, display_text: impl Into<String>, ref_type: RefType) -> Self {
        Reference {
            target: target.into(),
            display_text: display_text.into(),
            ref_type,
            target_title: None,
            target_section: None,
        }
    }
}

/// Root-only metadata recording where a tree came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMetadata {
    pub year: i32,
    pub source: String,
    pub format: SourceFormat,
}

/// A single node in a provision tree.
///
/// Only the child bucket matching `tag.deeper()` is ever populated; the
/// other four stay empty. This is enforced by construction (`push_child`)
/// rather than by the type system, matching the "single node record plus a
/// generic ordered children list" option from the design notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provision {
    pub id: String,
    pub tag: ProvisionLevel,
    pub num: String,
    pub heading: Option<String>,
    pub text: String,
    pub refs: Vec<Reference>,
    pub subsections: Vec<Provision>,
    pub paragraphs: Vec<Provision>,
    pub subparagraphs: Vec<Provision>,
    pub clauses: Vec<Provision>,
    pub subclauses: Vec<Provision>,
    pub metadata: Option<SectionMetadata>,
}

impl Provision {
    /// Build the root `section` node. Its id is the bare section base; it
    /// carries no `num` of its own.
    pub fn new_section(section: &str, heading: Option<String>, metadata: SectionMetadata) -> Self {
        Provision {
            id: section_base(section),
            tag: ProvisionLevel::Section,
            num: String::new(),
            heading,
            text: String::new(),
            refs: Vec::new(),
            subsections: Vec::new(),
            paragraphs: Vec::new(),
            subparagraphs: Vec::new(),
            clauses: Vec::new(),
            subclauses: Vec::new(),
            metadata: Some(metadata),
        }
    }

    /// Build a non-root node whose id is derived from `parent_id` and `num`
    /// per invariant 1 (`id == parent.id + "/" + unadorned(num)`).
    pub fn new_child(tag: ProvisionLevel, num: impl Into<String>, parent_id: &str) -> Self {
        let num = num.into();
        let id = canonical_id(parent_id, &num);
        Provision {
            id,
            tag,
            num,
            heading: None,
            text: String::new(),
            refs: Vec::new(),
            subsections: Vec::new(),
            paragraphs: Vec::new(),
            subparagraphs: Vec::new(),
            clauses: Vec::new(),
            subclauses: Vec::new(),
            metadata: None,
        }
    }

    /// Append `child` to the bucket matching its own `tag`. Panics if
    /// `child.tag` is `Section` — a section can never be a child of
    /// anything in this hierarchy.
    pub fn push_child(&mut self, child: Provision) {
        match child.tag {
            ProvisionLevel::Section => {
                unreachable!("a section-level node cannot be attached as a child")
            }
            ProvisionLevel::Subsection => self.subsections.push(child),
            ProvisionLevel::Paragraph => self.paragraphs.push(child),
            ProvisionLevel::Subparagraph => self.subparagraphs.push(child),
            ProvisionLevel::Clause => self.clauses.push(child),
            ProvisionLevel::Subclause => self.subclauses.push(child),
        }
    }

    /// Insert `child` at the front of the bucket matching its own `tag`.
    /// Used when a tree is assembled out of document order (e.g. folding a
    /// flat candidate list bottom-up, where descendants are finalized
    /// before the ancestor they belong under).
    pub fn push_child_front(&mut self, child: Provision) {
        match child.tag {
            ProvisionLevel::Section => {
                unreachable!("a section-level node cannot be attached as a child")
            }
            ProvisionLevel::Subsection => self.subsections.insert(0, child),
            ProvisionLevel::Paragraph => self.paragraphs.insert(0, child),
            ProvisionLevel::Subparagraph => self.subparagraphs.insert(0, child),
            ProvisionLevel::Clause => self.clauses.insert(0, child),
            ProvisionLevel::Subclause => self.subclauses.insert(0, child),
        }
    }

    /// Read access to the bucket for a given child level.
    pub fn bucket(&self, level: ProvisionLevel) -> &[Provision] {
        match level {
            ProvisionLevel::Section => &[],
            ProvisionLevel::Subsection => &self.subsections,
            ProvisionLevel::Paragraph => &self.paragraphs,
            ProvisionLevel::Subparagraph => &self.subparagraphs,
            ProvisionLevel::Clause => &self.clauses,
            ProvisionLevel::Subclause => &self.subclauses,
        }
    }

    /// Mutable access to the bucket for a given child level, used by the
    /// Format-B fold when attaching to a parent found deeper on the stack.
    pub fn bucket_mut(&mut self, level: ProvisionLevel) -> &mut Vec<Provision> {
        match level {
            ProvisionLevel::Section => unreachable!("sections have no section-level bucket"),
            ProvisionLevel::Subsection => &mut self.subsections,
            ProvisionLevel::Paragraph => &mut self.paragraphs,
            ProvisionLevel::Subparagraph => &mut self.subparagraphs,
            ProvisionLevel::Clause => &mut self.clauses,
            ProvisionLevel::Subclause => &mut self.subclauses,
        }
    }

    /// All five child buckets paired with their bucket name, in level
    /// order. Used by the structural diff engine's "do the child buckets
    /// differ" check (§4.6 step 3).
    pub fn all_buckets(&self) -> [(&'static str, &[Provision]); 5] {
        [
            ("subsections", &self.subsections),
            ("paragraphs", &self.paragraphs),
            ("subparagraphs", &self.subparagraphs),
            ("clauses", &self.clauses),
            ("subclauses", &self.subclauses),
        ]
    }

    /// All direct children across every bucket, in the fixed bucket order
    /// above (not necessarily document order across buckets, but each
    /// bucket is itself document-ordered per invariant 5).
    pub fn children(&self) -> impl Iterator<Item = &Provision> {
        self.subsections
            .iter()
            .chain(self.paragraphs.iter())
            .chain(self.subparagraphs.iter())
            .chain(self.clauses.iter())
            .chain(self.subclauses.iter())
    }
}

/// Strip the parentheses/brackets and surrounding whitespace from a raw
/// numbering token, leaving the "unadorned" form used to build ids.
pub fn unadorn(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']') && !c.is_whitespace())
        .collect()
}

/// The canonical path base for a section's root node:
/// `/us/usc/t18/s{section}`.
pub fn section_base(section: &str) -> String {
    format!("/us/usc/t18/s{section}")
}

/// Build a child id from its parent's id and its raw numbering token.
pub fn canonical_id(parent_id: &str, raw_num: &str) -> String {
    format!("{parent_id}/{}", unadorn(raw_num))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> SectionMetadata {
        SectionMetadata {
            year: 2024,
            source: "usc18.xml".to_string(),
            format: SourceFormat::NativeMarkup,
        }
    }

    #[test]
    fn unadorn_strips_parens_and_whitespace() {
        assert_eq!(unadorn("(a)"), "a");
        assert_eq!(unadorn("[(v)"), "v");
        assert_eq!(unadorn(" (1) "), "1");
    }

    #[test]
    fn canonical_id_builds_from_parent_and_token() {
        let base = section_base("922");
        assert_eq!(base, "/us/usc/t18/s922");
        assert_eq!(canonical_id(&base, "(a)"), "/us/usc/t18/s922/a");
    }

    #[test]
    fn new_child_computes_id_from_parent() {
        let base = section_base("922");
        let node = Provision::new_child(ProvisionLevel::Subsection, "(a)", &base);
        assert_eq!(node.id, "/us/usc/t18/s922/a");
        assert_eq!(node.tag, ProvisionLevel::Subsection);
    }

    #[test]
    fn push_child_routes_to_matching_bucket() {
        let base = section_base("922");
        let mut root = Provision::new_section("922", None, metadata());
        let sub = Provision::new_child(ProvisionLevel::Subsection, "(a)", &base);
        root.push_child(sub);
        assert_eq!(root.subsections.len(), 1);
        assert!(root.paragraphs.is_empty());
    }

    #[test]
    fn section_round_trips_json() {
        let root = Provision::new_section("922", Some("Unlawful acts".to_string()), metadata());
        let json = serde_json::to_string(&root).unwrap();
        let back: Provision = serde_json::from_str(&json).unwrap();
        assert_eq!(root, back);
    }

    #[test]
    fn all_buckets_reports_five_levels_in_order() {
        let root = Provision::new_section("922", None, metadata());
        let names: Vec<&str> = root.all_buckets().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["subsections", "paragraphs", "subparagraphs", "clauses", "subclauses"]
        );
    }
}
