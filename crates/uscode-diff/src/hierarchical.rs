//! Recursive, per-node diff between two provision trees matched by id,
//! with inline word/sentence-level diff spans on changed text.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};

use uscode_core::{Provision, ProvisionLevel};

use crate::structural::structural_shape_differs;
use crate::tokenize::{tokenize, Granularity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Unchanged,
    Modified,
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Unchanged,
    Added,
    Removed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSpan {
    pub kind: SpanKind,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchicalDiffNode {
    pub id: String,
    pub level: ProvisionLevel,
    pub num: String,
    pub heading: Option<String>,
    pub status: NodeStatus,
    pub inline_diff: Vec<DiffSpan>,
    pub children: Vec<HierarchicalDiffNode>,
}

/// Tokenize both texts at `granularity` and align them with Myers diff,
/// producing a sequence of unchanged/removed/added spans. A `replace` run
/// is emitted as a `removed` span immediately followed by an `added` span
/// — the two are never merged into a single "substituted" span.
pub fn inline_diff(old: &str, new: &str, granularity: Granularity) -> Vec<DiffSpan> {
    let old_tokens = tokenize(old, granularity);
    let new_tokens = tokenize(new, granularity);
    let ops = capture_diff_slices(Algorithm::Myers, &old_tokens, &new_tokens);

    let mut spans = Vec::new();
    for op in ops {
        match op {
            DiffOp::Equal { old_index, len, .. } => {
                spans.push(DiffSpan {
                    kind: SpanKind::Unchanged,
                    text: old_tokens[old_index..old_index + len].join(" "),
                });
            }
            DiffOp::Delete { old_index, old_len, .. } => {
                spans.push(DiffSpan {
                    kind: SpanKind::Removed,
                    text: old_tokens[old_index..old_index + old_len].join(" "),
                });
            }
            DiffOp::Insert { new_index, new_len, .. } => {
                spans.push(DiffSpan {
                    kind: SpanKind::Added,
                    text: new_tokens[new_index..new_index + new_len].join(" "),
                });
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                spans.push(DiffSpan {
                    kind: SpanKind::Removed,
                    text: old_tokens[old_index..old_index + old_len].join(" "),
                });
                spans.push(DiffSpan {
                    kind: SpanKind::Added,
                    text: new_tokens[new_index..new_index + new_len].join(" "),
                });
            }
        }
    }
    spans
}

fn whole_subtree(node: &Provision, status: NodeStatus) -> HierarchicalDiffNode {
    HierarchicalDiffNode {
        id: node.id.clone(),
        level: node.tag,
        num: node.num.clone(),
        heading: node.heading.clone(),
        status,
        inline_diff: Vec::new(),
        children: Vec::new(),
    }
}

fn diff_children(old: &Provision, new: &Provision, granularity: Granularity) -> Vec<HierarchicalDiffNode> {
    let old_children: HashMap<&str, &Provision> = old.children().map(|c| (c.id.as_str(), c)).collect();
    let new_children: HashMap<&str, &Provision> = new.children().map(|c| (c.id.as_str(), c)).collect();

    let mut ids: Vec<&str> = old_children.keys().chain(new_children.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();

    ids.into_iter()
        .map(|id| match (old_children.get(id), new_children.get(id)) {
            (Some(o), Some(n)) => diff_matched(o, n, granularity),
            (Some(o), None) => whole_subtree(o, NodeStatus::Removed),
            (None, Some(n)) => whole_subtree(n, NodeStatus::Added),
            (None, None) => unreachable!("id drawn from the union of both maps"),
        })
        .collect()
}

/// Diff two nodes known to share the same id, recursing into children
/// matched by id and producing inline spans when their own text differs.
pub fn diff_matched(old: &Provision, new: &Provision, granularity: Granularity) -> HierarchicalDiffNode {
    let texts_equal = old.text.trim() == new.text.trim();
    let inline = if texts_equal {
        Vec::new()
    } else {
        inline_diff(&old.text, &new.text, granularity)
    };

    let status = if texts_equal && !structural_shape_differs(old, new) {
        NodeStatus::Unchanged
    } else {
        NodeStatus::Modified
    };

    let children = diff_children(old, new, granularity);

    HierarchicalDiffNode {
        id: new.id.clone(),
        level: new.tag,
        num: new.num.clone(),
        heading: new.heading.clone(),
        status,
        inline_diff: inline,
        children,
    }
}

/// Entry point: diff two trees rooted at the same section-year pair.
pub fn diff_trees(old: &Provision, new: &Provision, granularity: Granularity) -> HierarchicalDiffNode {
    diff_matched(old, new, granularity)
}

/// Run [`diff_trees`] over many section pairs concurrently, collecting
/// results back in input order.
pub fn diff_many(pairs: &[(&Provision, &Provision)], granularity: Granularity) -> Vec<HierarchicalDiffNode> {
    pairs.par_iter().map(|(o, n)| diff_trees(o, n, granularity)).collect()
}
