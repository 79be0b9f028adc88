//! Configuration types
//!
//! Node configuration and the parser for its `node.toml` text form.

pub mod parse;
pub mod types;

pub use parse::*;
pub use types::*;
