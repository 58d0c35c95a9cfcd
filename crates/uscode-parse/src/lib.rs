pub mod config;
pub mod fixups;
pub mod format_a;
pub mod format_b;
pub mod loader;
pub mod numbering;
pub mod reference;
pub mod references;
pub mod tokens;

pub use config::{YearSource, YearsConfig};
pub use loader::SectionLoader;
pub use references::{flatten_references, ReferenceRecord};
