//! Named prompt templates for the generation flows.
//!
//! Templates are rendered with tera before they cross the generation
//! boundary, so the service only ever sees final prompt text. Every prompt
//! instructs the model to answer with a single JSON object matching the
//! flow's typed outcome.

use tera::{Context, Tera};

use crate::generation::GenerationError;

pub const TRIAGE_PROMPT: &str = "triage_visitor";
pub const UPSELL_PROMPT: &str = "upsell_suggestions";
pub const RECAP_PROMPT: &str = "visit_recap";
pub const DAILY_SUMMARY_PROMPT: &str = "daily_summary";

const TRIAGE_TEMPLATE: &str = "\
You are an expert at qualifying leads for new home sales. Based on the \
following information from a visitor, classify them as \"Hot Now\", \
\"Researching\", or \"Just Looking\".

Budget: {{ budget }}
Timeline: {{ timeline }}
Must-Have Feature: {{ must_have }}

Criteria:
- \"Hot Now\": short timeline (e.g. < 3 months), specific budget, clear must-haves. Urgent buyers.
- \"Researching\": mid-range timeline (3-6 months), may have a budget, exploring options. Serious but not in a rush.
- \"Just Looking\": long timeline (> 6 months or undecided), vague or no budget, general interest. Early in the process.

Answer with a single JSON object:
{\"status\": \"<one of the three labels>\", \"reasoning\": \"<one sentence>\"}";

const UPSELL_TEMPLATE: &str = "\
You are an assistant for a new home sales host, providing real-time upsell \
nudges during a customer tour. Be helpful and insightful, never pushy.

Visitor information:
- Observed behavior and cues: {{ visitor_behavior }}
- Stated preferences: {{ stated_preferences }}
- Currently viewing: {{ current_selections }}

Generate 2-3 specific, relevant suggestions - structural options, design \
upgrades, or a lot that fits their needs - plus a brief reasoning for why \
they fit this visitor. The suggestions should read as advice that enhances \
their future home, not a hard sell.

Answer with a single JSON object:
{\"suggestions\": [\"<suggestion>\", ...], \"reasoning\": \"<why these fit>\"}";

const RECAP_TEMPLATE: &str = "\
You craft personalized visit recaps for customers who toured a show home. \
Use the following to write a warm, engaging recap:

Customer Name: {{ customer_name }}
Customer Preferences: {{ customer_preferences }}
Photos from the tour:{% for url in photo_urls %}
- {{ url }}{% else %} none attached{% endfor %}
Notes: {{ notes }}
Available Homes: {{ available_homes }}

Write a brief recap that highlights the customer's interests, references \
the specific preferences they shared, and closes with a friendly call to \
action. Do not be overly sales-y.

Answer with a single JSON object:
{\"recap\": \"<the recap text>\"}";

const DAILY_SUMMARY_TEMPLATE: &str = "\
You are a sales manager debriefing a new-home sales host at end of day.

Today's visitors:
{% for visitor in visitors %}- Name: {{ visitor.name }}, Status: {{ visitor.status }}, Budget: {{ visitor.budget }}, Must-Have: {{ visitor.must_have }}
{% endfor %}
Write a 2-3 sentence summary of the day's activity. It should be \
encouraging and insightful, and mention the total number of visitors and \
how many were \"Hot Now\". Do not invent numbers beyond those counts.

Answer with a single JSON object:
{\"summary\": \"<the narrative summary>\"}";

pub fn render(prompt_name: &'static str, context: &Context) -> Result<String, GenerationError> {
    let template = match prompt_name {
        TRIAGE_PROMPT => TRIAGE_TEMPLATE,
        UPSELL_PROMPT => UPSELL_TEMPLATE,
        RECAP_PROMPT => RECAP_TEMPLATE,
        DAILY_SUMMARY_PROMPT => DAILY_SUMMARY_TEMPLATE,
        other => {
            return Err(GenerationError::Template {
                prompt_name: other,
                detail: "unknown prompt template".to_string(),
            })
        }
    };

    Tera::one_off(template, context, false)
        .map_err(|error| GenerationError::Template { prompt_name, detail: error.to_string() })
}

/// Placeholder for intake fields the visitor skipped.
pub fn or_not_stated(value: Option<&str>) -> String {
    value.map(str::to_string).unwrap_or_else(|| "not stated".to_string())
}

#[cfg(test)]
mod tests {
    use tera::Context;

    use super::{or_not_stated, render, TRIAGE_PROMPT, UPSELL_PROMPT};

    #[test]
    fn triage_prompt_carries_all_three_signals() {
        let mut context = Context::new();
        context.insert("budget", ">800");
        context.insert("timeline", "<3");
        context.insert("must_have", "home office");

        let prompt = render(TRIAGE_PROMPT, &context).expect("render");
        assert!(prompt.contains(">800"));
        assert!(prompt.contains("<3"));
        assert!(prompt.contains("home office"));
        assert!(prompt.contains("Hot Now"));
    }

    #[test]
    fn upsell_prompt_renders_optional_selection() {
        let mut context = Context::new();
        context.insert("visitor_behavior", "lingered in the kitchen");
        context.insert("stated_preferences", "loves to cook");
        context.insert("current_selections", or_not_stated(None).as_str());

        let prompt = render(UPSELL_PROMPT, &context).expect("render");
        assert!(prompt.contains("lingered in the kitchen"));
        assert!(prompt.contains("not stated"));
    }

    #[test]
    fn unknown_prompt_name_is_a_template_error() {
        let error = render("no_such_prompt", &Context::new()).expect_err("should fail");
        assert!(error.to_string().contains("no_such_prompt"));
    }
}
