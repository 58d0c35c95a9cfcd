pub mod error;
pub mod level;
pub mod tree;

pub use error::*;
pub use level::*;
pub use tree::*;
