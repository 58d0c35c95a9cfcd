//! Thin timing/identity wrapper around a diff call, for callers that want
//! to log or persist a run the way the rest of this family of tools does.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use uscode_core::Provision;

use crate::hierarchical::{self, HierarchicalDiffNode};
use crate::structural::{self, StructuralDiffResult};
use crate::tokenize::Granularity;

/// A diff result tagged with a run identity and wall-clock duration, mirroring
/// the identity/timing fields the rest of this family of tools attaches to
/// every compare run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffRun<T> {
    pub run_id: Uuid,
    pub elapsed_ms: u64,
    pub result: T,
}

fn timed<T>(f: impl FnOnce() -> T) -> DiffRun<T> {
    let start = Instant::now();
    let result = f();
    DiffRun {
        run_id: Uuid::new_v4(),
        elapsed_ms: start.elapsed().as_millis() as u64,
        result,
    }
}

/// Run the structural diff engine, tagging the result with a run id and
/// elapsed time.
pub fn run_structural_diff(left: &Provision, right: &Provision) -> DiffRun<StructuralDiffResult> {
    timed(|| structural::diff_trees(left, right))
}

/// Run the hierarchical diff engine, tagging the result with a run id and
/// elapsed time.
pub fn run_hierarchical_diff(left: &Provision, right: &Provision, granularity: Granularity) -> DiffRun<HierarchicalDiffNode> {
    timed(|| hierarchical::diff_trees(left, right, granularity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uscode_core::SectionMetadata;
    use uscode_core::SourceFormat;

    fn metadata() -> SectionMetadata {
        SectionMetadata {
            year: 2024,
            source: "usc18.xml".to_string(),
            format: SourceFormat::NativeMarkup,
        }
    }

    #[test]
    fn structural_run_carries_a_fresh_run_id() {
        let root = Provision::new_section("922", None, metadata());
        let other = root.clone();
        let run = run_structural_diff(&root, &other);
        assert_ne!(run.run_id, Uuid::nil());
        assert_eq!(run.result.stats.unchanged, 1);
    }

    #[test]
    fn hierarchical_run_carries_a_fresh_run_id() {
        let root = Provision::new_section("922", None, metadata());
        let other = root.clone();
        let run = run_hierarchical_diff(&root, &other, Granularity::Word);
        assert_ne!(run.run_id, Uuid::nil());
    }
}
