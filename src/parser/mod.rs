//! Document parsing: the parser contract, the registry of available
//! parsers, and the dispatcher that runs them over a document tree.

mod clearlydefined;
mod dispatch;
mod registry;
mod traits;

pub use clearlydefined::ClearlyDefinedParser;
pub use dispatch::{parse_document_tree, DispatchError, ParsedTree};
pub use registry::{ParserFactory, ParserRegistry};
pub use traits::{DocumentParser, IdentifierStrings, ParseError, TrustInformation};
