use serde::{Deserialize, Serialize};
use tera::Context;

use crate::generation::{GenerationClient, GenerationError, GenerationRequest};
use crate::prompts::{self, UPSELL_PROMPT};

/// Observations the host feeds the advisor mid-tour.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UpsellInput {
    pub visitor_behavior: String,
    pub stated_preferences: String,
    #[serde(default)]
    pub current_selections: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsellOutcome {
    pub suggestions: Vec<String>,
    pub reasoning: String,
}

/// Produce 2-3 upsell nudges from tour observations. Stateless; every
/// invocation stands alone.
pub async fn suggest_upsells(
    client: &dyn GenerationClient,
    input: &UpsellInput,
) -> Result<UpsellOutcome, GenerationError> {
    let mut context = Context::new();
    context.insert("visitor_behavior", &input.visitor_behavior);
    context.insert("stated_preferences", &input.stated_preferences);
    context
        .insert("current_selections", &prompts::or_not_stated(input.current_selections.as_deref()));

    let prompt = prompts::render(UPSELL_PROMPT, &context)?;
    let value = client
        .generate_json(GenerationRequest { prompt_name: UPSELL_PROMPT, prompt })
        .await?;

    let outcome: UpsellOutcome =
        serde_json::from_value(value).map_err(|error| GenerationError::Contract {
            prompt_name: UPSELL_PROMPT,
            detail: error.to_string(),
        })?;

    if outcome.suggestions.is_empty() {
        return Err(GenerationError::Contract {
            prompt_name: UPSELL_PROMPT,
            detail: "at least one suggestion is required".to_string(),
        });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::{suggest_upsells, UpsellInput};
    use crate::generation::{GenerationClient, GenerationError, GenerationRequest};

    struct StubClient {
        response: Value,
        seen_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl GenerationClient for StubClient {
        async fn generate_json(
            &self,
            request: GenerationRequest,
        ) -> Result<Value, GenerationError> {
            *self.seen_prompt.lock().expect("prompt lock") = Some(request.prompt);
            Ok(self.response.clone())
        }
    }

    fn input() -> UpsellInput {
        UpsellInput {
            visitor_behavior: "spent a long time in the backyard".to_string(),
            stated_preferences: "wants a place to entertain".to_string(),
            current_selections: Some("Standard Finishes".to_string()),
        }
    }

    #[tokio::test]
    async fn suggestions_carry_through_with_reasoning() {
        let client = StubClient {
            response: json!({
                "suggestions": [
                    "Suggest the outdoor kitchen package",
                    "Show the covered deck option"
                ],
                "reasoning": "Both build on their love of the backyard and entertaining."
            }),
            seen_prompt: Mutex::new(None),
        };

        let outcome = suggest_upsells(&client, &input()).await.expect("upsell");

        assert_eq!(outcome.suggestions.len(), 2);
        assert!(outcome.reasoning.contains("backyard"));

        let prompt = client.seen_prompt.lock().expect("lock").clone().expect("prompt");
        assert!(prompt.contains("Standard Finishes"));
        assert!(prompt.contains("wants a place to entertain"));
    }

    #[tokio::test]
    async fn empty_suggestion_list_breaks_the_contract() {
        let client = StubClient {
            response: json!({"suggestions": [], "reasoning": "nothing fits"}),
            seen_prompt: Mutex::new(None),
        };

        let error = suggest_upsells(&client, &input()).await.expect_err("should fail");
        assert!(matches!(error, GenerationError::Contract { .. }));
    }
}
