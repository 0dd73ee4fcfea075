//! Ordered set of extractors taking part in a build
//!
//! Registration order is merge priority: when two sources produce the same
//! printer, the one registered first wins.

use super::PrinterExtractor;
use crate::catalog::Source;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn PrinterExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an extractor, replacing any earlier one for the same source
    pub fn register(&mut self, extractor: Arc<dyn PrinterExtractor>) {
        let source = extractor.source();
        match self.extractors.iter().position(|e| e.source() == source) {
            Some(idx) => self.extractors[idx] = extractor,
            None => self.extractors.push(extractor),
        }
    }

    pub fn with(mut self, extractor: Arc<dyn PrinterExtractor>) -> Self {
        self.register(extractor);
        self
    }

    pub fn get(&self, source: Source) -> Option<&Arc<dyn PrinterExtractor>> {
        self.extractors.iter().find(|e| e.source() == source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn PrinterExtractor>> {
        self.extractors.iter()
    }

    pub fn sources(&self) -> Vec<Source> {
        self.extractors.iter().map(|e| e.source()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}
