//! Flattens a parsed tree's per-node `refs` lists into the flat reference
//! stream consumed by downstream reference/graph tooling (out of scope
//! here — this module only produces the records, it does not store or
//! index them).

use serde::{Deserialize, Serialize};
use uscode_core::{Provision, RefType};

/// One outgoing cross-reference, addressed by provision id rather than by
/// its owning node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub source_section: String,
    pub source_provision_id: String,
    pub target_provision_id: String,
    pub target_title: Option<String>,
    pub target_section: Option<String>,
    pub display_text: String,
    pub ref_type: RefType,
}

/// Walk `root` in document order, emitting one [`ReferenceRecord`] per
/// outgoing reference on every node (including the root itself).
pub fn flatten_references(section: &str, root: &Provision) -> Vec<ReferenceRecord> {
    let mut out = Vec::new();
    collect(section, root, &mut out);
    out
}

fn collect(section: &str, node: &Provision, out: &mut Vec<ReferenceRecord>) {
    for r in &node.refs {
        out.push(ReferenceRecord {
            source_section: section.to_string(),
            source_provision_id: node.id.clone(),
            target_provision_id: r.target.clone(),
            target_title: r.target_title.clone(),
            target_section: r.target_section.clone(),
            display_text: r.display_text.clone(),
            ref_type: r.ref_type,
        });
    }
    for child in node.children() {
        collect(section, child, out);
    }
}
