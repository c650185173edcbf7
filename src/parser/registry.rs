//! Parser registry: maps (format, type) to a parser constructor
//!
//! Supporting a new document format means registering a constructor here;
//! the dispatcher never changes.

use super::clearlydefined::ClearlyDefinedParser;
use super::traits::DocumentParser;
use crate::document::{DocumentFormat, DocumentType};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a fresh parser for one document.
pub type ParserFactory = Arc<dyn Fn() -> Box<dyn DocumentParser> + Send + Sync>;

/// Registry of available parsers.
#[derive(Clone)]
pub struct ParserRegistry {
    factories: HashMap<(DocumentFormat, DocumentType), ParserFactory>,
}

impl ParserRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in parser.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DocumentFormat::Json, DocumentType::ClearlyDefined, || {
            Box::new(ClearlyDefinedParser::new())
        });
        registry
    }

    /// Register a constructor, replacing any previous one for the same key.
    pub fn register<F>(&mut self, format: DocumentFormat, doc_type: DocumentType, factory: F)
    where
        F: Fn() -> Box<dyn DocumentParser> + Send + Sync + 'static,
    {
        self.factories.insert((format, doc_type), Arc::new(factory));
    }

    /// Construct a parser for the given key, if one is registered.
    pub fn create(&self, format: DocumentFormat, doc_type: DocumentType) -> Option<Box<dyn DocumentParser>> {
        self.factories.get(&(format, doc_type)).map(|factory| factory())
    }

    pub fn supports(&self, format: DocumentFormat, doc_type: DocumentType) -> bool {
        self.factories.contains_key(&(format, doc_type))
    }

    /// Number of registered parsers
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
