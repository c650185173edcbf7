//! Documents and the tree builder

mod tree;
mod types;

pub use tree::{BundleUnpacker, TreeBuilder, TreeError, Unpacker};
pub use types::{Document, DocumentFormat, DocumentTree, DocumentType, SourceInformation};
