use serde::{Deserialize, Serialize};
use tera::Context;

use showhome_core::domain::visit::VisitStage;

use crate::generation::{GenerationClient, GenerationError, GenerationRequest};
use crate::prompts::{self, TRIAGE_PROMPT};

/// Intake answers forwarded to the classifier. All three are optional;
/// the model is told which ones the visitor skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriageInput {
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub must_have: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageOutcome {
    pub status: VisitStage,
    pub reasoning: String,
}

/// Classify a visitor's buying urgency from their intake answers.
///
/// Failures surface as [`GenerationError`]; the intake action treats them
/// as degradation and proceeds without a classification.
pub async fn triage_visitor(
    client: &dyn GenerationClient,
    input: &TriageInput,
) -> Result<TriageOutcome, GenerationError> {
    let mut context = Context::new();
    context.insert("budget", &prompts::or_not_stated(input.budget.as_deref()));
    context.insert("timeline", &prompts::or_not_stated(input.timeline.as_deref()));
    context.insert("must_have", &prompts::or_not_stated(input.must_have.as_deref()));

    let prompt = prompts::render(TRIAGE_PROMPT, &context)?;
    let value = client
        .generate_json(GenerationRequest { prompt_name: TRIAGE_PROMPT, prompt })
        .await?;

    let outcome: TriageOutcome =
        serde_json::from_value(value).map_err(|error| GenerationError::Contract {
            prompt_name: TRIAGE_PROMPT,
            detail: error.to_string(),
        })?;

    if outcome.reasoning.trim().is_empty() {
        return Err(GenerationError::Contract {
            prompt_name: TRIAGE_PROMPT,
            detail: "reasoning must not be empty".to_string(),
        });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use showhome_core::domain::visit::VisitStage;

    use super::{triage_visitor, TriageInput};
    use crate::generation::{GenerationClient, GenerationError, GenerationRequest};

    /// Stub that records the rendered prompt and replays a canned payload.
    struct StubClient {
        response: Result<Value, &'static str>,
        seen_prompt: Mutex<Option<String>>,
    }

    impl StubClient {
        fn returning(response: Value) -> Self {
            Self { response: Ok(response), seen_prompt: Mutex::new(None) }
        }

        fn failing(detail: &'static str) -> Self {
            Self { response: Err(detail), seen_prompt: Mutex::new(None) }
        }

        fn prompt(&self) -> String {
            self.seen_prompt.lock().expect("prompt lock").clone().expect("prompt captured")
        }
    }

    #[async_trait]
    impl GenerationClient for StubClient {
        async fn generate_json(
            &self,
            request: GenerationRequest,
        ) -> Result<Value, GenerationError> {
            *self.seen_prompt.lock().expect("prompt lock") = Some(request.prompt);
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(detail) => Err(GenerationError::Transport(detail.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn urgent_intake_classifies_hot_now() {
        let client = StubClient::returning(json!({
            "status": "Hot Now",
            "reasoning": "Short timeline with a specific high budget and a concrete must-have."
        }));
        let input = TriageInput {
            budget: Some(">800".to_string()),
            timeline: Some("<3".to_string()),
            must_have: Some("home office".to_string()),
        };

        let outcome = triage_visitor(&client, &input).await.expect("triage");

        assert_eq!(outcome.status, VisitStage::HotNow);
        assert!(!outcome.reasoning.trim().is_empty());

        let prompt = client.prompt();
        assert!(prompt.contains(">800"));
        assert!(prompt.contains("<3"));
        assert!(prompt.contains("home office"));
    }

    #[tokio::test]
    async fn skipped_answers_render_as_not_stated() {
        let client = StubClient::returning(json!({
            "status": "Just Looking",
            "reasoning": "No budget or timeline was shared."
        }));

        let outcome =
            triage_visitor(&client, &TriageInput::default()).await.expect("triage");
        assert_eq!(outcome.status, VisitStage::JustLooking);
        assert!(client.prompt().contains("not stated"));
    }

    #[tokio::test]
    async fn unknown_stage_label_breaks_the_contract() {
        let client = StubClient::returning(json!({
            "status": "Lukewarm",
            "reasoning": "unsure"
        }));

        let error = triage_visitor(&client, &TriageInput::default())
            .await
            .expect_err("should fail contract");
        assert!(matches!(error, GenerationError::Contract { .. }));
    }

    #[tokio::test]
    async fn empty_reasoning_breaks_the_contract() {
        let client = StubClient::returning(json!({"status": "Researching", "reasoning": "  "}));

        let error = triage_visitor(&client, &TriageInput::default())
            .await
            .expect_err("should fail contract");
        assert!(matches!(error, GenerationError::Contract { .. }));
    }

    #[tokio::test]
    async fn transport_failure_propagates_for_caller_degradation() {
        let client = StubClient::failing("endpoint unreachable");

        let error =
            triage_visitor(&client, &TriageInput::default()).await.expect_err("should fail");
        assert!(matches!(error, GenerationError::Transport(_)));
    }
}
