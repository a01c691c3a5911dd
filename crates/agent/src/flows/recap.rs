use serde::{Deserialize, Serialize};
use tera::Context;

use crate::generation::{GenerationClient, GenerationError, GenerationRequest};
use crate::prompts::{self, RECAP_PROMPT};

/// Everything the recap email draws on: the host's notes, the visitor's
/// stated preferences, tour photos, and the live model lineup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecapInput {
    pub customer_name: String,
    pub customer_preferences: String,
    pub photo_urls: Vec<String>,
    pub notes: String,
    pub available_homes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecapOutcome {
    pub recap: String,
}

/// Draft a personalized visit recap for the customer to take home.
pub async fn generate_visit_recap(
    client: &dyn GenerationClient,
    input: &RecapInput,
) -> Result<RecapOutcome, GenerationError> {
    let mut context = Context::new();
    context.insert("customer_name", &input.customer_name);
    context.insert("customer_preferences", &input.customer_preferences);
    context.insert("photo_urls", &input.photo_urls);
    context.insert("notes", &input.notes);
    context.insert("available_homes", &input.available_homes.join(", "));

    let prompt = prompts::render(RECAP_PROMPT, &context)?;
    let value = client
        .generate_json(GenerationRequest { prompt_name: RECAP_PROMPT, prompt })
        .await?;

    let outcome: RecapOutcome =
        serde_json::from_value(value).map_err(|error| GenerationError::Contract {
            prompt_name: RECAP_PROMPT,
            detail: error.to_string(),
        })?;

    if outcome.recap.trim().is_empty() {
        return Err(GenerationError::Contract {
            prompt_name: RECAP_PROMPT,
            detail: "recap text must not be empty".to_string(),
        });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::{generate_visit_recap, RecapInput};
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

    fn input() -> RecapInput {
        RecapInput {
            customer_name: "The Miller Family".to_string(),
            customer_preferences: "Loved the open concept kitchen".to_string(),
            photo_urls: vec!["https://photos.example.com/kitchen.jpg".to_string()],
            notes: "Their son Leo liked the bonus room.".to_string(),
            available_homes: vec!["The Aspen ($450,000)".to_string(), "The Birch ($520,000)".to_string()],
        }
    }

    #[tokio::test]
    async fn recap_prompt_includes_photos_and_inventory() {
        let client = StubClient {
            response: json!({"recap": "Thanks for touring with us today!"}),
            seen_prompt: Mutex::new(None),
        };

        let outcome = generate_visit_recap(&client, &input()).await.expect("recap");
        assert!(!outcome.recap.is_empty());

        let prompt = client.seen_prompt.lock().expect("lock").clone().expect("prompt");
        assert!(prompt.contains("https://photos.example.com/kitchen.jpg"));
        assert!(prompt.contains("The Aspen ($450,000), The Birch ($520,000)"));
        assert!(prompt.contains("The Miller Family"));
    }

    #[tokio::test]
    async fn empty_recap_breaks_the_contract() {
        let client =
            StubClient { response: json!({"recap": ""}), seen_prompt: Mutex::new(None) };

        let error = generate_visit_recap(&client, &input()).await.expect_err("should fail");
        assert!(matches!(error, GenerationError::Contract { .. }));
    }
}
