//! services/api/src/adapters/layout.rs
//!
//! The browser measures the elements it has mounted and sends their boxes
//! along with the request. This adapter answers `LayoutService` lookups from
//! that report.

use movie_diary_core::anchor::ElementBox;
use movie_diary_core::ports::LayoutService;
use std::collections::HashMap;

/// Element boxes keyed by selector, as reported by the client.
#[derive(Debug, Clone, Default)]
pub struct ReportedLayout {
    boxes: HashMap<String, ElementBox>,
}

impl ReportedLayout {
    pub fn new(boxes: HashMap<String, ElementBox>) -> Self {
        Self { boxes }
    }
}

impl LayoutService for ReportedLayout {
    fn bounding_box(&self, selector: &str) -> Option<ElementBox> {
        // Zero-sized boxes belong to hidden elements.
        self.boxes
            .get(selector)
            .filter(|b| b.width > 0.0 || b.height > 0.0)
            .copied()
    }
}
