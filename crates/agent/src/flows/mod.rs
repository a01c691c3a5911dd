pub mod daily_summary;
pub mod recap;
pub mod triage;
pub mod upsell;

pub use daily_summary::{summarize_day, DailySummaryOutcome, DailyVisitorDigest};
pub use recap::{generate_visit_recap, RecapInput, RecapOutcome};
pub use triage::{triage_visitor, TriageInput, TriageOutcome};
pub use upsell::{suggest_upsells, UpsellInput, UpsellOutcome};
