//! Flat, id-keyed structural diff between two provision trees.
//!
//! This engine does no semantic alignment — nodes are matched strictly by
//! canonical id. A renumbering across years shows up as a `deleted` at the
//! old id plus an `added` at the new id; pairing those back up is left to
//! whatever consumes this output.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use uscode_core::{Provision, ProvisionLevel, Reference};

/// Disposition of one matched (or unmatched) id between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Deleted,
    Modified,
    Unchanged,
}

/// The fields of a node that matter for structural comparison and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub num: String,
    pub tag: ProvisionLevel,
    pub text: String,
    pub refs: Vec<Reference>,
}

impl NodeSummary {
    fn of(node: &Provision) -> Self {
        NodeSummary {
            id: node.id.clone(),
            num: node.num.clone(),
            tag: node.tag,
            text: node.text.clone(),
            refs: node.refs.clone(),
        }
    }
}

/// One entry in the ordered structural diff output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralDiffEntry {
    pub id: String,
    pub status: DiffStatus,
    pub old: Option<NodeSummary>,
    pub new: Option<NodeSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuralDiffStats {
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralDiffResult {
    pub entries: Vec<StructuralDiffEntry>,
    pub stats: StructuralDiffStats,
}

fn flatten<'a>(root: &'a Provision, out: &mut HashMap<String, &'a Provision>) {
    out.insert(root.id.clone(), root);
    for child in root.children() {
        flatten(child, out);
    }
}

/// Whether two matched nodes' populated child levels or child counts differ,
/// independent of whether their own text differs.
pub(crate) fn structural_shape_differs(left: &Provision, right: &Provision) -> bool {
    left.all_buckets()
        .iter()
        .zip(right.all_buckets().iter())
        .any(|((_, l), (_, r))| l.len() != r.len())
}

/// Diff two trees for the same section, matching strictly by id.
///
/// Ids are drawn from the union of both trees and visited in lexicographic
/// order, which is stable and hierarchy-respecting because canonical ids
/// share a fixed token alphabet per level.
pub fn diff_trees(left: &Provision, right: &Provision) -> StructuralDiffResult {
    let mut left_map = HashMap::new();
    flatten(left, &mut left_map);
    let mut right_map = HashMap::new();
    flatten(right, &mut right_map);

    let mut ids: Vec<&String> = left_map.keys().chain(right_map.keys()).collect();
    ids.sort();
    ids.dedup();

    let mut stats = StructuralDiffStats::default();
    let mut entries = Vec::with_capacity(ids.len());

    for id in ids {
        let l = left_map.get(id).copied();
        let r = right_map.get(id).copied();
        let (status, old, new) = match (l, r) {
            (None, Some(r)) => (DiffStatus::Added, None, Some(NodeSummary::of(r))),
            (Some(l), None) => (DiffStatus::Deleted, Some(NodeSummary::of(l)), None),
            (Some(l), Some(r)) => {
                let texts_equal = l.text.trim() == r.text.trim();
                let status = if texts_equal {
                    if structural_shape_differs(l, r) {
                        DiffStatus::Modified
                    } else {
                        DiffStatus::Unchanged
                    }
                } else {
                    DiffStatus::Modified
                };
                (status, Some(NodeSummary::of(l)), Some(NodeSummary::of(r)))
            }
            (None, None) => unreachable!("id drawn from the union of both maps"),
        };

        match status {
            DiffStatus::Added => stats.added += 1,
            DiffStatus::Deleted => stats.deleted += 1,
            DiffStatus::Modified => stats.modified += 1,
            DiffStatus::Unchanged => stats.unchanged += 1,
        }
        stats.total += 1;

        entries.push(StructuralDiffEntry {
            id: id.clone(),
            status,
            old,
            new,
        });
    }

    StructuralDiffResult { entries, stats }
}

/// Run [`diff_trees`] over many section pairs concurrently, collecting
/// results back in input order so parallelism never leaks into the output.
pub fn diff_many(pairs: &[(&Provision, &Provision)]) -> Vec<StructuralDiffResult> {
    pairs.par_iter().map(|(l, r)| diff_trees(l, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uscode_core::{ProvisionLevel as Level, SectionMetadata, SourceFormat};

    fn metadata() -> SectionMetadata {
        SectionMetadata {
            year: 2024,
            source: "usc18.xml".to_string(),
            format: SourceFormat::NativeMarkup,
        }
    }

    fn base_tree() -> Provision {
        let mut root = Provision::new_section("922", Some("Unlawful acts".to_string()), metadata());
        let mut a = Provision::new_child(Level::Subsection, "(a)", &root.id);
        a.text = "It shall be unlawful for any person.".to_string();
        root.push_child(a);
        root
    }

    #[test]
    fn identical_trees_are_all_unchanged() {
        let left = base_tree();
        let right = base_tree();
        let result = diff_trees(&left, &right);
        assert_eq!(result.stats.unchanged, 2);
        assert_eq!(result.stats.modified, 0);
        assert_eq!(result.stats.added, 0);
        assert_eq!(result.stats.deleted, 0);
    }

    #[test]
    fn changed_text_is_modified() {
        let left = base_tree();
        let mut right = base_tree();
        right.subsections[0].text = "It shall be unlawful for any licensed person.".to_string();
        let result = diff_trees(&left, &right);
        assert_eq!(result.stats.modified, 1);
        assert_eq!(result.stats.unchanged, 1);
    }

    #[test]
    fn new_child_is_added_and_old_child_is_deleted() {
        let left = base_tree();
        let mut right = base_tree();
        right.subsections.push(Provision::new_child(Level::Subsection, "(b)", &right.id));

        let result = diff_trees(&left, &right);
        assert_eq!(result.stats.added, 1);
        assert_eq!(result.stats.deleted, 0);

        let mut right_missing_a = base_tree();
        right_missing_a.subsections.clear();
        let result2 = diff_trees(&left, &right_missing_a);
        assert_eq!(result2.stats.deleted, 1);
    }

    #[test]
    fn renumbering_appears_as_delete_plus_add_at_distinct_ids() {
        let left = base_tree();
        let mut right = Provision::new_section("922", Some("Unlawful acts".to_string()), metadata());
        let mut b = Provision::new_child(Level::Subsection, "(b)", &right.id);
        b.text = "It shall be unlawful for any person.".to_string();
        right.push_child(b);

        let result = diff_trees(&left, &right);
        let ids: Vec<&str> = result.entries.iter().map(|e| e.id.as_str()).collect();
        assert!(ids.contains(&"/us/usc/t18/s922/a"));
        assert!(ids.contains(&"/us/usc/t18/s922/b"));
        assert_eq!(result.stats.added, 1);
        assert_eq!(result.stats.deleted, 1);
    }

    #[test]
    fn identical_text_but_different_shape_is_modified() {
        let mut left = base_tree();
        let mut right = base_tree();
        let mut child = Provision::new_child(Level::Paragraph, "(1)", &right.subsections[0].id);
        child.text = "a new clause".to_string();
        right.subsections[0].push_child(child);
        left.subsections[0].text = right.subsections[0].text.clone();

        let result = diff_trees(&left, &right);
        let entry = result.entries.iter().find(|e| e.id == "/us/usc/t18/s922/a").unwrap();
        assert_eq!(entry.status, DiffStatus::Modified);
    }

    #[test]
    fn diff_many_preserves_input_order() {
        let left = base_tree();
        let right = base_tree();
        let pairs: Vec<(&Provision, &Provision)> = (0..5).map(|_| (&left, &right)).collect();
        let results = diff_many(&pairs);
        assert_eq!(results.len(), 5);
        for r in &results {
            assert_eq!(r.stats.unchanged, 2);
        }
    }
}
