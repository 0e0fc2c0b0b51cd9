//! crates/movie_diary_core/src/anchor.rs
//!
//! Tooltip placement relative to a highlighted element.

use serde::{Deserialize, Serialize};

use crate::domain::StepPosition;

/// Distance between the highlighted element and the tooltip anchor.
pub const ANCHOR_GAP: f64 = 20.0;

/// An element's bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBox {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// A viewport coordinate the tooltip is positioned from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub top: f64,
    pub left: f64,
}

/// Where the presentation layer should put the tooltip for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    Anchored { anchor: Anchor, target: ElementBox },
    /// Viewport-centered, without a highlighted element.
    Centered,
}

/// Computes the anchor for `position` around `target`.
///
/// `Center` has no anchor; the caller centers the tooltip in the viewport.
pub fn compute_anchor(target: &ElementBox, position: StepPosition) -> Option<Anchor> {
    let horizontal_mid = target.left + target.width / 2.0;
    let vertical_mid = target.top + target.height / 2.0;
    match position {
        StepPosition::Top => Some(Anchor {
            top: target.top - ANCHOR_GAP,
            left: horizontal_mid,
        }),
        StepPosition::Bottom => Some(Anchor {
            top: target.bottom() + ANCHOR_GAP,
            left: horizontal_mid,
        }),
        StepPosition::Left => Some(Anchor {
            top: vertical_mid,
            left: target.left - ANCHOR_GAP,
        }),
        StepPosition::Right => Some(Anchor {
            top: vertical_mid,
            left: target.right() + ANCHOR_GAP,
        }),
        StepPosition::Center => None,
    }
}

/// Resolves a step's selector and position into a placement, falling back to
/// `Centered` when there is no selector, no anchor, or no matching element.
pub fn place(
    target: Option<&str>,
    position: StepPosition,
    lookup: impl FnOnce(&str) -> Option<ElementBox>,
) -> Placement {
    let Some(selector) = target else {
        return Placement::Centered;
    };
    let Some(element) = lookup(selector) else {
        return Placement::Centered;
    };
    match compute_anchor(&element, position) {
        Some(anchor) => Placement::Anchored {
            anchor,
            target: element,
        },
        None => Placement::Centered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: ElementBox = ElementBox {
        top: 100.0,
        left: 50.0,
        width: 40.0,
        height: 20.0,
    };

    #[test]
    fn bottom_anchor_sits_below_the_element() {
        assert_eq!(
            compute_anchor(&BOX, StepPosition::Bottom),
            Some(Anchor {
                top: 140.0,
                left: 70.0
            })
        );
    }

    #[test]
    fn side_and_top_anchors() {
        assert_eq!(
            compute_anchor(&BOX, StepPosition::Top),
            Some(Anchor { top: 80.0, left: 70.0 })
        );
        assert_eq!(
            compute_anchor(&BOX, StepPosition::Left),
            Some(Anchor { top: 110.0, left: 30.0 })
        );
        assert_eq!(
            compute_anchor(&BOX, StepPosition::Right),
            Some(Anchor {
                top: 110.0,
                left: 110.0
            })
        );
        assert_eq!(compute_anchor(&BOX, StepPosition::Center), None);
    }

    #[test]
    fn missing_element_falls_back_to_center() {
        let placement = place(Some("#nowhere"), StepPosition::Bottom, |_| None);
        assert_eq!(placement, Placement::Centered);
    }

    #[test]
    fn no_selector_never_looks_up() {
        let placement = place(None, StepPosition::Top, |_| panic!("lookup must not run"));
        assert_eq!(placement, Placement::Centered);
    }
}
