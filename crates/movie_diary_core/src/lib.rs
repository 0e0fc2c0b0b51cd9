pub mod anchor;
pub mod domain;
pub mod feed;
pub mod onboarding;
pub mod panel;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use anchor::{compute_anchor, Anchor, ElementBox, Placement};
pub use domain::{
    Activity, ActivityFilter, ActivityPayload, ActivityType, MediaType, OnboardingRecord,
    OnboardingStep, ReviewRecord, ReviewSignal, StepPosition, TitleDetails, TitleKey,
    TrendingEntry,
};
pub use feed::{FeedAggregator, ReviewPreviewRequest};
pub use onboarding::{OnboardingEngine, TourSnapshot, TourState};
pub use panel::{Panel, PanelState};
pub use ports::{CatalogService, LayoutService, PersistenceService, PortError, PortResult};
