//! Lead-funnel and pipeline aggregation for the analytics tab.
//!
//! All arithmetic here is deterministic; the generation service only ever
//! writes the narrative text around these numbers.

use serde::{Deserialize, Serialize};

use crate::domain::visit::{Visit, VisitStage};

/// Hold tracking is not built yet; the dashboard still renders the tile.
const HOLDS_PLACEHOLDER: u64 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: VisitStage,
    pub count: u64,
}

/// Aggregates for one shift, as rendered on the dashboard summary cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub total_visitors: u64,
    pub hot_leads: u64,
    pub holds: u64,
    /// Estimated aggregate dollar value of open opportunities.
    pub pipeline: i64,
    /// Always carries all three stage labels, zero-filled.
    pub lead_funnel: Vec<StageCount>,
}

/// Static objection reference content shown next to the funnel. Logged
/// objections are not captured yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectionTrend {
    pub label: &'static str,
    pub mentions: u64,
}

pub const OBJECTION_TRENDS: [ObjectionTrend; 5] = [
    ObjectionTrend { label: "Price", mentions: 12 },
    ObjectionTrend { label: "Timeline", mentions: 8 },
    ObjectionTrend { label: "Lot Size", mentions: 5 },
    ObjectionTrend { label: "Finishes", mentions: 3 },
    ObjectionTrend { label: "Location", mentions: 2 },
];

/// A visit that was never classified counts as `Researching`, matching the
/// dashboard's historical default.
fn effective_stage(visit: &Visit) -> VisitStage {
    visit.stage.unwrap_or(VisitStage::Researching)
}

/// Compute the shift summary over the full visit set.
///
/// Pipeline rule: `Hot Now` contributes its budget ceiling (floor when
/// open-ended), `Researching` contributes its floor, `Just Looking`
/// contributes nothing.
pub fn summarize(visits: &[Visit]) -> ShiftSummary {
    let mut hot = 0u64;
    let mut researching = 0u64;
    let mut looking = 0u64;
    let mut pipeline = 0i64;

    for visit in visits {
        match effective_stage(visit) {
            VisitStage::HotNow => {
                hot += 1;
                pipeline += visit.budget_max.unwrap_or(visit.budget_min);
            }
            VisitStage::Researching => {
                researching += 1;
                pipeline += visit.budget_min;
            }
            VisitStage::JustLooking => {
                looking += 1;
            }
        }
    }

    ShiftSummary {
        total_visitors: visits.len() as u64,
        hot_leads: hot,
        holds: HOLDS_PLACEHOLDER,
        pipeline,
        lead_funnel: vec![
            StageCount { stage: VisitStage::HotNow, count: hot },
            StageCount { stage: VisitStage::Researching, count: researching },
            StageCount { stage: VisitStage::JustLooking, count: looking },
        ],
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{summarize, OBJECTION_TRENDS};
    use crate::domain::visit::{Visit, VisitId, VisitStage};
    use crate::domain::visitor::VisitorId;

    fn visit_fixture(stage: Option<VisitStage>, budget_min: i64, budget_max: Option<i64>) -> Visit {
        Visit {
            id: VisitId::generate(),
            visitor_id: VisitorId::generate(),
            host_user_id: None,
            stage,
            budget_min,
            budget_max,
            timeline: None,
            must_have: None,
            notes: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    #[test]
    fn funnel_always_carries_all_three_stages() {
        let summary = summarize(&[]);

        assert_eq!(summary.lead_funnel.len(), 3);
        for stage in VisitStage::ALL {
            assert!(summary.lead_funnel.iter().any(|entry| entry.stage == stage));
        }
        assert_eq!(summary.total_visitors, 0);
        assert_eq!(summary.pipeline, 0);
    }

    #[test]
    fn funnel_counts_sum_to_total() {
        let visits = vec![
            visit_fixture(Some(VisitStage::HotNow), 400_000, Some(450_000)),
            visit_fixture(Some(VisitStage::JustLooking), 800_000, None),
            visit_fixture(Some(VisitStage::Researching), 500_000, Some(550_000)),
            visit_fixture(None, 0, None),
        ];

        let summary = summarize(&visits);
        let funnel_total: u64 = summary.lead_funnel.iter().map(|entry| entry.count).sum();

        assert_eq!(funnel_total, summary.total_visitors);
        assert_eq!(summary.total_visitors, 4);
    }

    #[test]
    fn pipeline_matches_stated_example() {
        let visits = vec![
            visit_fixture(Some(VisitStage::HotNow), 650_000, Some(750_000)),
            visit_fixture(Some(VisitStage::Researching), 500_000, None),
        ];

        assert_eq!(summarize(&visits).pipeline, 1_250_000);
    }

    #[test]
    fn open_ended_hot_budget_falls_back_to_floor() {
        let visits = vec![visit_fixture(Some(VisitStage::HotNow), 800_000, None)];
        assert_eq!(summarize(&visits).pipeline, 800_000);
    }

    #[test]
    fn just_looking_contributes_nothing_to_pipeline() {
        let visits = vec![visit_fixture(Some(VisitStage::JustLooking), 900_000, Some(950_000))];
        assert_eq!(summarize(&visits).pipeline, 0);
    }

    #[test]
    fn unclassified_visit_counts_as_researching() {
        let visits = vec![visit_fixture(None, 500_000, Some(550_000))];

        let summary = summarize(&visits);
        let researching = summary
            .lead_funnel
            .iter()
            .find(|entry| entry.stage == VisitStage::Researching)
            .expect("researching entry");

        assert_eq!(researching.count, 1);
        assert_eq!(summary.pipeline, 500_000);
        assert_eq!(summary.hot_leads, 0);
    }

    #[test]
    fn holds_tile_is_zero_until_holds_land() {
        let summary = summarize(&[visit_fixture(Some(VisitStage::HotNow), 1, None)]);
        assert_eq!(summary.holds, 0);
        assert!(!OBJECTION_TRENDS.is_empty());
    }
}
