//! Intake validation and budget-bucket parsing.
//!
//! The intake form reports budgets as bucket tokens in thousands of
//! dollars: `"<500"` means up to $500k, `">800"` means $800k and up,
//! `"500-650"` is a closed range. Parsing strips non-digit noise inside a
//! segment, so `"$500k-$650k"` and `"500-650"` are equivalent.

use serde::{Deserialize, Serialize};

use crate::domain::visit::{NewVisit, VisitStage};
use crate::domain::visitor::NewVisitor;
use crate::errors::DomainError;

/// Dollar bounds derived from a budget bucket token. `max` of `None`
/// means open-ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: i64,
    pub max: Option<i64>,
}

impl BudgetRange {
    pub const UNSTATED: BudgetRange = BudgetRange { min: 0, max: None };
}

/// Parse a budget bucket token into dollar bounds.
///
/// An empty or whitespace token means the visitor skipped the question.
/// A non-empty token must match one of the three bucket forms; anything
/// else is a validation error reported inline at intake.
pub fn parse_budget_bucket(token: &str) -> Result<BudgetRange, DomainError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(BudgetRange::UNSTATED);
    }

    let invalid = || DomainError::InvalidBudgetBucket { token: token.to_string() };

    if let Some(rest) = token.strip_prefix('<') {
        let max = thousands(rest).ok_or_else(invalid)?;
        return Ok(BudgetRange { min: 0, max: Some(max) });
    }

    if let Some(rest) = token.strip_prefix('>') {
        let min = thousands(rest).ok_or_else(invalid)?;
        return Ok(BudgetRange { min, max: None });
    }

    if let Some((low, high)) = token.split_once('-') {
        let min = thousands(low).ok_or_else(invalid)?;
        let max = thousands(high).ok_or_else(invalid)?;
        if max < min {
            return Err(DomainError::InvertedBudgetRange { min, max });
        }
        return Ok(BudgetRange { min, max: Some(max) });
    }

    Err(invalid())
}

/// Extract the digits of a bucket segment and scale to whole dollars.
fn thousands(segment: &str) -> Option<i64> {
    let digits: String = segment.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|value| value * 1000)
}

/// Raw intake form submission, before any validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IntakeForm {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub must_have: Option<String>,
}

/// Intake data that passed validation and budget parsing. Nothing is
/// persisted until one of these exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedIntake {
    pub visitor: NewVisitor,
    pub budget: BudgetRange,
    pub timeline: Option<String>,
    pub must_have: Option<String>,
}

impl IntakeForm {
    pub fn validate(&self) -> Result<ValidatedIntake, DomainError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::MissingVisitorName);
        }

        let budget = match self.budget.as_deref() {
            Some(token) => parse_budget_bucket(token)?,
            None => BudgetRange::UNSTATED,
        };

        Ok(ValidatedIntake {
            visitor: NewVisitor {
                name: name.to_string(),
                email: non_empty(self.email.as_deref()),
                phone: non_empty(self.phone.as_deref()),
            },
            budget,
            timeline: non_empty(self.timeline.as_deref()),
            must_have: non_empty(self.must_have.as_deref()),
        })
    }
}

impl ValidatedIntake {
    /// Attach the triage outcome (or its absence) and produce the records
    /// the store persists together.
    pub fn into_records(self, stage: Option<VisitStage>) -> (NewVisitor, NewVisit) {
        let visit = NewVisit {
            stage,
            budget_min: self.budget.min,
            budget_max: self.budget.max,
            timeline: self.timeline,
            must_have: self.must_have,
        };
        (self.visitor, visit)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
