//! LSP feature implementations
pub mod completion;
