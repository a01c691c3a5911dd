use serde::{Deserialize, Serialize};
use tera::Context;

use showhome_core::domain::visit::VisitStage;

use crate::generation::{GenerationClient, GenerationError, GenerationRequest};
use crate::prompts::{self, DAILY_SUMMARY_PROMPT};

const QUIET_DAY_SUMMARY: &str =
    "It was a quiet day. No visitors were recorded. Let's get ready for a great day tomorrow!";

/// One visitor line in the end-of-day digest handed to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyVisitorDigest {
    pub name: String,
    pub status: String,
    pub budget: String,
    pub must_have: String,
}

impl DailyVisitorDigest {
    pub fn new(
        name: &str,
        stage: Option<VisitStage>,
        budget: Option<&str>,
        must_have: Option<&str>,
    ) -> Self {
        Self {
            name: name.to_string(),
            status: stage.map(|s| s.as_str().to_string()).unwrap_or_else(|| "Unclassified".to_string()),
            budget: prompts::or_not_stated(budget),
            must_have: prompts::or_not_stated(must_have),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummaryOutcome {
    pub summary: String,
}

/// Write the end-of-day narrative over the day's visitor digest.
///
/// The pipeline and hold figures shown beside this text are deterministic
/// aggregates from `showhome_core::analytics`, never model output. An
/// empty day skips the model entirely.
pub async fn summarize_day(
    client: &dyn GenerationClient,
    visitors: &[DailyVisitorDigest],
) -> Result<DailySummaryOutcome, GenerationError> {
    if visitors.is_empty() {
        return Ok(DailySummaryOutcome { summary: QUIET_DAY_SUMMARY.to_string() });
    }

    let mut context = Context::new();
    context.insert("visitors", visitors);

    let prompt = prompts::render(DAILY_SUMMARY_PROMPT, &context)?;
    let value = client
        .generate_json(GenerationRequest { prompt_name: DAILY_SUMMARY_PROMPT, prompt })
        .await?;

    let outcome: DailySummaryOutcome =
        serde_json::from_value(value).map_err(|error| GenerationError::Contract {
            prompt_name: DAILY_SUMMARY_PROMPT,
            detail: error.to_string(),
        })?;

    if outcome.summary.trim().is_empty() {
        return Err(GenerationError::Contract {
            prompt_name: DAILY_SUMMARY_PROMPT,
            detail: "summary must not be empty".to_string(),
        });
    }

    Ok(outcome)
}
