//! Generation flows - hosted-model wrappers for the sales floor
//!
//! This crate owns every interaction with the text-generation service:
//! - Lead triage at intake (`flows::triage`)
//! - Upsell nudges during a tour (`flows::upsell`)
//! - Personalized visit recaps (`flows::recap`)
//! - End-of-day narrative summaries (`flows::daily_summary`)
//!
//! # Architecture
//!
//! Each flow is a stateless function over a [`GenerationClient`]: it renders
//! a named prompt template, sends it, and deserializes the returned JSON
//! into a typed outcome. The service is an opaque collaborator - structured
//! prompt in, structured JSON out - and its failures surface as a single
//! [`GenerationError`] with no provider-specific codes.
//!
//! # Safety Principle
//!
//! The model never computes business numbers. Pipeline and hold figures are
//! deterministic aggregates in `showhome-core`; flows only classify and
//! write prose.

pub mod flows;
pub mod generation;
pub mod prompts;

pub use generation::{GenerationClient, GenerationError, GenerationRequest, HttpGenerationClient};
