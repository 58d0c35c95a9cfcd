pub mod hierarchical;
pub mod run;
pub mod structural;
pub mod tokenize;

pub use hierarchical::{diff_trees as diff_hierarchical, HierarchicalDiffNode, NodeStatus, SpanKind, DiffSpan};
pub use run::{run_hierarchical_diff, run_structural_diff, DiffRun};
pub use structural::{diff_trees as diff_structural, DiffStatus, NodeSummary, StructuralDiffEntry, StructuralDiffResult, StructuralDiffStats};
pub use tokenize::Granularity;
