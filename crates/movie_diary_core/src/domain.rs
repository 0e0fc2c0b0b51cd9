//! crates/movie_diary_core/src/domain.rs
//!
//! Defines the core data structures for the movie diary client.
//! Records arriving from the document store deserialize straight into these
//! types (camelCase field names), and the display records serialize back out
//! for the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Catalog Identity
//=========================================================================================

/// Which catalog endpoint a title lives under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

/// Composite identity of a title across movie and TV catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TitleKey {
    pub movie_id: u64,
    pub media_type: MediaType,
}

impl fmt::Display for TitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.media_type.as_str(), self.movie_id)
    }
}

/// Display metadata returned by the catalog service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetails {
    pub title: String,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
}

//=========================================================================================
// Reviews
//=========================================================================================

/// A raw review document as stored by the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    #[serde(default)]
    pub id: String,
    pub movie_id: u64,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub movie_title: Option<String>,
    #[serde(default, alias = "moviePoster")]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

/// A display-ready review preview for the landing page.
///
/// At most one signal per `movie_id` appears in any list produced by the
/// aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSignal {
    pub id: String,
    pub movie_id: u64,
    pub media_type: MediaType,
    pub title: Option<String>,
    pub poster_url: Option<String>,
    pub rating: Option<f64>,
    pub excerpt: String,
    pub author: String,
    /// Calendar date in `yyyy.MM.dd` form.
    pub date: String,
}

impl ReviewSignal {
    pub fn key(&self) -> TitleKey {
        TitleKey {
            movie_id: self.movie_id,
            media_type: self.media_type,
        }
    }

    /// True when a display field is still absent and the catalog should be asked.
    pub fn needs_enrichment(&self) -> bool {
        self.title.is_none() || self.poster_url.is_none()
    }
}

//=========================================================================================
// Activity Feed
//=========================================================================================

/// One entry of the social activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: ActivityPayload,
}

/// Type-specific part of an activity, tagged by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActivityPayload {
    Log {
        movie_id: u64,
        #[serde(default)]
        media_type: MediaType,
        movie_title: String,
        #[serde(default)]
        poster_url: Option<String>,
        #[serde(default)]
        rating: Option<f64>,
    },
    Review {
        movie_id: u64,
        #[serde(default)]
        media_type: MediaType,
        movie_title: String,
        #[serde(default)]
        poster_url: Option<String>,
        #[serde(default)]
        rating: Option<f64>,
        #[serde(default)]
        content: String,
    },
    ListCreated {
        #[serde(default)]
        list_id: Option<String>,
        list_name: String,
    },
    Favorite {
        movie_id: u64,
        #[serde(default)]
        media_type: MediaType,
        movie_title: String,
        #[serde(default)]
        poster_url: Option<String>,
    },
    Connection {
        target_user_id: String,
        target_user_name: String,
    },
    PollCreated {
        #[serde(default)]
        poll_id: Option<String>,
        question: String,
    },
    DebateCreated {
        #[serde(default)]
        debate_id: Option<String>,
        title: String,
    },
}

impl ActivityPayload {
    pub fn kind(&self) -> ActivityType {
        match self {
            ActivityPayload::Log { .. } => ActivityType::Log,
            ActivityPayload::Review { .. } => ActivityType::Review,
            ActivityPayload::ListCreated { .. } => ActivityType::ListCreated,
            ActivityPayload::Favorite { .. } => ActivityType::Favorite,
            ActivityPayload::Connection { .. } => ActivityType::Connection,
            ActivityPayload::PollCreated { .. } => ActivityType::PollCreated,
            ActivityPayload::DebateCreated { .. } => ActivityType::DebateCreated,
        }
    }
}

impl Activity {
    pub fn kind(&self) -> ActivityType {
        self.payload.kind()
    }

    /// A one-line, human-readable description of the activity.
    pub fn summary(&self) -> String {
        let who = &self.user_name;
        match &self.payload {
            ActivityPayload::Log {
                movie_title,
                rating: Some(rating),
                ..
            } => format!("{who} logged {movie_title} ({rating:.1}★)"),
            ActivityPayload::Log { movie_title, .. } => format!("{who} logged {movie_title}"),
            ActivityPayload::Review { movie_title, .. } => {
                format!("{who} reviewed {movie_title}")
            }
            ActivityPayload::ListCreated { list_name, .. } => {
                format!("{who} created the list \"{list_name}\"")
            }
            ActivityPayload::Favorite { movie_title, .. } => {
                format!("{who} added {movie_title} to favorites")
            }
            ActivityPayload::Connection {
                target_user_name, ..
            } => format!("{who} followed {target_user_name}"),
            ActivityPayload::PollCreated { question, .. } => {
                format!("{who} started a poll: {question}")
            }
            ActivityPayload::DebateCreated { title, .. } => {
                format!("{who} opened a debate: {title}")
            }
        }
    }
}

/// The `type` discriminator of an activity, used for client-side filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Log,
    Review,
    ListCreated,
    Favorite,
    Connection,
    PollCreated,
    DebateCreated,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Log => "log",
            ActivityType::Review => "review",
            ActivityType::ListCreated => "list_created",
            ActivityType::Favorite => "favorite",
            ActivityType::Connection => "connection",
            ActivityType::PollCreated => "poll_created",
            ActivityType::DebateCreated => "debate_created",
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(ActivityType::Log),
            "review" => Ok(ActivityType::Review),
            "list_created" => Ok(ActivityType::ListCreated),
            "favorite" => Ok(ActivityType::Favorite),
            "connection" => Ok(ActivityType::Connection),
            "poll_created" => Ok(ActivityType::PollCreated),
            "debate_created" => Ok(ActivityType::DebateCreated),
            other => Err(format!("unknown activity type '{other}'")),
        }
    }
}

/// Client-side feed filter. `All` is the identity filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityFilter {
    #[default]
    All,
    Only(ActivityType),
}

impl ActivityFilter {
    pub fn matches(&self, activity: &Activity) -> bool {
        match self {
            ActivityFilter::All => true,
            ActivityFilter::Only(kind) => activity.kind() == *kind,
        }
    }
}

impl FromStr for ActivityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(ActivityFilter::All);
        }
        s.parse().map(ActivityFilter::Only)
    }
}

//=========================================================================================
// Trending
//=========================================================================================

/// A ranked trending title, aggregated upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingEntry {
    pub movie_id: u64,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub log_count: u32,
    #[serde(default)]
    pub favorite_count: u32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub weekly_logs: u32,
    #[serde(default)]
    pub monthly_logs: u32,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub trending_score: Option<f64>,
}

impl TrendingEntry {
    pub fn key(&self) -> TitleKey {
        TitleKey {
            movie_id: self.movie_id,
            media_type: self.media_type,
        }
    }
}

//=========================================================================================
// Onboarding
//=========================================================================================

/// Where a tooltip sits relative to its highlighted element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPosition {
    Top,
    Bottom,
    Left,
    Right,
    #[default]
    Center,
}

/// One step of the guided tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStep {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Selector of the element to highlight. `None` means a centered step.
    pub target: Option<String>,
    pub position: StepPosition,
}

impl OnboardingStep {
    /// A centered step with no highlighted element.
    pub fn centered(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            target: None,
            position: StepPosition::Center,
        }
    }

    /// Anchors the step to the element matched by `selector`.
    pub fn anchored(mut self, selector: &str, position: StepPosition) -> Self {
        self.target = Some(selector.to_string());
        self.position = position;
        self
    }
}

/// The persisted outcome of a user's tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRecord {
    pub completed: bool,
    pub skipped: bool,
    pub completed_at: DateTime<Utc>,
}

impl OnboardingRecord {
    pub fn finished(at: DateTime<Utc>) -> Self {
        Self {
            completed: true,
            skipped: false,
            completed_at: at,
        }
    }

    pub fn skipped(at: DateTime<Utc>) -> Self {
        Self {
            completed: true,
            skipped: true,
            completed_at: at,
        }
    }
}
