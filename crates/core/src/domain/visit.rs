use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::host::Host;
use super::visitor::{Visitor, VisitorId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitId(pub String);

impl VisitId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for VisitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Triage classification of a visit's buying urgency.
///
/// The wire labels are the exact strings the triage prompt emits and the
/// dashboard displays; `as_str`/`parse` round-trip them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisitStage {
    #[serde(rename = "Hot Now")]
    HotNow,
    #[serde(rename = "Researching")]
    Researching,
    #[serde(rename = "Just Looking")]
    JustLooking,
}

impl VisitStage {
    pub const ALL: [VisitStage; 3] =
        [VisitStage::HotNow, VisitStage::Researching, VisitStage::JustLooking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HotNow => "Hot Now",
            Self::Researching => "Researching",
            Self::JustLooking => "Just Looking",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Hot Now" => Some(Self::HotNow),
            "Researching" => Some(Self::Researching),
            "Just Looking" => Some(Self::JustLooking),
            _ => None,
        }
    }
}

impl std::fmt::Display for VisitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tour engagement between a visitor and a host, bounded by
/// `started_at`/`ended_at`. A visit is active exactly while `ended_at` is
/// `None`. `stage` is `None` when triage was unavailable at intake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub visitor_id: VisitorId,
    pub host_user_id: Option<String>,
    pub stage: Option<VisitStage>,
    /// Whole dollars. `budget_max`, when present, is >= `budget_min`.
    pub budget_min: i64,
    pub budget_max: Option<i64>,
    pub timeline: Option<String>,
    pub must_have: Option<String>,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Visit {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Visit attributes known at intake time, before ids and timestamps are
/// assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVisit {
    pub stage: Option<VisitStage>,
    pub budget_min: i64,
    pub budget_max: Option<i64>,
    pub timeline: Option<String>,
    pub must_have: Option<String>,
}

/// A visit joined with its visitor and (when assigned) host, as the
/// dashboard and tour page consume it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitWithVisitor {
    pub visit: Visit,
    pub visitor: Visitor,
    pub host: Option<Host>,
}

/// Photo taken during a tour, attached to the visit for the recap email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitPhoto {
    pub id: String,
    pub visit_id: VisitId,
    pub url: String,
    pub caption: Option<String>,
}
