//! JSON API for the sales floor.
//!
//! Endpoints:
//! - `POST /api/v1/intake`                  - triage + create visitor/visit
//! - `GET  /api/v1/visits/active`           - active visits, newest first
//! - `GET  /api/v1/visits/{id}`             - one visit with visitor + host
//! - `POST /api/v1/visits/{id}/end`         - close out a tour
//! - `POST /api/v1/visits/{id}/photos`      - attach a tour photo
//! - `POST /api/v1/visits/{id}/upsell`      - upsell nudges for the host
//! - `POST /api/v1/visits/{id}/recap`       - personalized follow-up draft
//! - `GET  /api/v1/inventory`               - active home models
//! - `GET  /api/v1/analytics`               - funnel, pipeline, objections
//! - `POST /api/v1/admin/seed`              - token-guarded demo reset
//!
//! Handlers depend on the repository traits, not the SQL layer, so the
//! same surface runs against the in-memory store in tests.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tera::Tera;
use tracing::{info, warn};
use uuid::Uuid;

use showhome_agent::flows::{
    generate_visit_recap, suggest_upsells, summarize_day, triage_visitor, DailyVisitorDigest,
    RecapInput, RecapOutcome, TriageInput, TriageOutcome, UpsellInput, UpsellOutcome,
};
use showhome_agent::{GenerationClient, GenerationError};
use showhome_core::analytics::{self, ObjectionTrend, ShiftSummary, OBJECTION_TRENDS};
use showhome_core::domain::host::Host;
use showhome_core::domain::inventory::InventoryModel;
use showhome_core::domain::visit::{VisitId, VisitPhoto, VisitStage, VisitWithVisitor};
use showhome_core::errors::ApplicationError;
use showhome_core::intake::IntakeForm;
use showhome_db::repositories::{InventoryRepository, RepositoryError, VisitRepository};
use showhome_db::{DbPool, ShowroomSeedDataset};

#[derive(Clone)]
pub struct AppState {
    pub visits: Arc<dyn VisitRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub generation: Arc<dyn GenerationClient>,
    pub default_host: Host,
    pub admin_token: Option<SecretString>,
    pub db_pool: DbPool,
    pub templates: Arc<Tera>,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct VisitorView {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HostView {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct VisitView {
    pub id: String,
    pub visitor: VisitorView,
    pub host: Option<HostView>,
    pub stage: Option<VisitStage>,
    pub budget_min: i64,
    pub budget_max: Option<i64>,
    pub timeline: Option<String>,
    pub must_have: Option<String>,
    pub notes: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub active: bool,
}

impl From<&VisitWithVisitor> for VisitView {
    fn from(record: &VisitWithVisitor) -> Self {
        Self {
            id: record.visit.id.0.clone(),
            visitor: VisitorView {
                id: record.visitor.id.0.clone(),
                name: record.visitor.name.clone(),
                email: record.visitor.email.clone(),
                phone: record.visitor.phone.clone(),
            },
            host: record
                .host
                .as_ref()
                .map(|host| HostView { name: host.name.clone(), email: host.email.clone() }),
            stage: record.visit.stage,
            budget_min: record.visit.budget_min,
            budget_max: record.visit.budget_max,
            timeline: record.visit.timeline.clone(),
            must_have: record.visit.must_have.clone(),
            notes: record.visit.notes.clone(),
            started_at: record.visit.started_at.to_rfc3339(),
            ended_at: record.visit.ended_at.map(|ts| ts.to_rfc3339()),
            active: record.visit.is_active(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub visit: VisitView,
    pub triage: Option<TriageOutcome>,
    /// Set when triage degraded; the visit was still created.
    pub triage_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EndVisitResponse {
    pub ended: bool,
    pub ended_at: String,
}

#[derive(Debug, Deserialize)]
pub struct PhotoRequest {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsellRequest {
    pub visitor_behavior: String,
    #[serde(default)]
    pub stated_preferences: Option<String>,
    #[serde(default)]
    pub current_selections: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecapRequest {
    #[serde(default)]
    pub customer_preferences: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub summary: ShiftSummary,
    pub objection_trends: Vec<ObjectionTrend>,
    pub narrative: Option<String>,
    pub narrative_error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub narrative: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub models_seeded: usize,
    pub visits_seeded: usize,
    pub verified: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/intake", post(create_intake))
        .route("/api/v1/visits/active", get(list_active_visits))
        .route("/api/v1/visits/{id}", get(get_visit))
        .route("/api/v1/visits/{id}/end", post(end_visit))
        .route("/api/v1/visits/{id}/photos", post(add_photo))
        .route("/api/v1/visits/{id}/upsell", post(upsell))
        .route("/api/v1/visits/{id}/recap", post(recap))
        .route("/api/v1/inventory", get(list_inventory))
        .route("/api/v1/analytics", get(analytics_tab))
        .route("/api/v1/admin/seed", post(admin_seed))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Intake: validate, triage, then persist visitor + visit together. A
/// triage failure is reported in the response but never blocks creation.
pub async fn create_intake(
    State(state): State<AppState>,
    Json(form): Json<IntakeForm>,
) -> Result<(StatusCode, Json<IntakeResponse>), (StatusCode, Json<ApiError>)> {
    let validated = form.validate().map_err(|error| {
        let correlation_id = new_correlation_id();
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError { error: error.to_string(), correlation_id }),
        )
    })?;

    let triage_input = TriageInput {
        budget: form.budget.clone().filter(|token| !token.trim().is_empty()),
        timeline: validated.timeline.clone(),
        must_have: validated.must_have.clone(),
    };

    let (triage, triage_error) =
        match triage_visitor(state.generation.as_ref(), &triage_input).await {
            Ok(outcome) => (Some(outcome), None),
            Err(error) => {
                warn!(
                    event_name = "intake.triage_degraded",
                    error = %error,
                    "triage unavailable, proceeding with manual intake"
                );
                (
                    None,
                    Some(
                        "Could not triage visitor. Proceeding with manual intake.".to_string(),
                    ),
                )
            }
        };

    let stage = triage.as_ref().map(|outcome| outcome.status);
    let (new_visitor, new_visit) = validated.into_records(stage);

    let created = state
        .visits
        .create_intake(new_visitor, new_visit, Some(&state.default_host))
        .await
        .map_err(|error| repository_failure("intake.create", error))?;

    info!(
        event_name = "intake.created",
        visit_id = %created.visit.id,
        stage = stage.map(|s| s.as_str()).unwrap_or("unclassified"),
        "visitor intake completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(IntakeResponse { visit: VisitView::from(&created), triage, triage_error }),
    ))
}

pub async fn list_active_visits(
    State(state): State<AppState>,
) -> Result<Json<Vec<VisitView>>, (StatusCode, Json<ApiError>)> {
    let visits = state
        .visits
        .list_active()
        .await
        .map_err(|error| repository_failure("visits.list_active", error))?;

    Ok(Json(visits.iter().map(VisitView::from).collect()))
}

pub async fn get_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VisitView>, (StatusCode, Json<ApiError>)> {
    let record = state
        .visits
        .find_by_id(&VisitId(id))
        .await
        .map_err(|error| repository_failure("visits.find", error))?;

    match record {
        Some(record) => Ok(Json(VisitView::from(&record))),
        None => Err(visit_not_found()),
    }
}

pub async fn end_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EndVisitResponse>, (StatusCode, Json<ApiError>)> {
    let visit_id = VisitId(id);
    let record = state
        .visits
        .find_by_id(&visit_id)
        .await
        .map_err(|error| repository_failure("visits.find", error))?;

    let Some(record) = record else {
        return Err(visit_not_found());
    };
    if !record.visit.is_active() {
        let correlation_id = new_correlation_id();
        return Err((
            StatusCode::CONFLICT,
            Json(ApiError { error: "visit already ended".to_string(), correlation_id }),
        ));
    }

    let ended_at = Utc::now();
    let ended = state
        .visits
        .end_visit(&visit_id, ended_at)
        .await
        .map_err(|error| repository_failure("visits.end", error))?;

    Ok(Json(EndVisitResponse { ended, ended_at: ended_at.to_rfc3339() }))
}

pub async fn add_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PhotoRequest>,
) -> Result<(StatusCode, Json<VisitPhoto>), (StatusCode, Json<ApiError>)> {
    let visit_id = VisitId(id);
    let record = state
        .visits
        .find_by_id(&visit_id)
        .await
        .map_err(|error| repository_failure("visits.find", error))?;
    if record.is_none() {
        return Err(visit_not_found());
    }

    let photo = VisitPhoto {
        id: Uuid::new_v4().to_string(),
        visit_id,
        url: request.url,
        caption: request.caption,
    };
    state
        .visits
        .add_photo(photo.clone())
        .await
        .map_err(|error| repository_failure("visits.add_photo", error))?;

    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn upsell(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpsellRequest>,
) -> Result<Json<UpsellOutcome>, (StatusCode, Json<ApiError>)> {
    let record = state
        .visits
        .find_by_id(&VisitId(id))
        .await
        .map_err(|error| repository_failure("visits.find", error))?;
    let Some(record) = record else {
        return Err(visit_not_found());
    };

    let stated_preferences = request
        .stated_preferences
        .or_else(|| record.visit.must_have.clone())
        .unwrap_or_default();

    let input = UpsellInput {
        visitor_behavior: request.visitor_behavior,
        stated_preferences,
        current_selections: request.current_selections,
    };

    let outcome = suggest_upsells(state.generation.as_ref(), &input)
        .await
        .map_err(|error| generation_failure("upsell", error))?;

    Ok(Json(outcome))
}

pub async fn recap(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RecapRequest>,
) -> Result<Json<RecapOutcome>, (StatusCode, Json<ApiError>)> {
    let visit_id = VisitId(id);
    let record = state
        .visits
        .find_by_id(&visit_id)
        .await
        .map_err(|error| repository_failure("visits.find", error))?;
    let Some(record) = record else {
        return Err(visit_not_found());
    };

    let photos = state
        .visits
        .list_photos(&visit_id)
        .await
        .map_err(|error| repository_failure("visits.list_photos", error))?;
    let models = state
        .inventory
        .list_active()
        .await
        .map_err(|error| repository_failure("inventory.list", error))?;

    let input = RecapInput {
        customer_name: record.visitor.name.clone(),
        customer_preferences: request
            .customer_preferences
            .or_else(|| record.visit.must_have.clone())
            .unwrap_or_default(),
        photo_urls: photos.into_iter().map(|photo| photo.url).collect(),
        notes: request.notes.unwrap_or_default(),
        available_homes: models.iter().map(InventoryModel::display_line).collect(),
    };

    let outcome = generate_visit_recap(state.generation.as_ref(), &input)
        .await
        .map_err(|error| generation_failure("recap", error))?;

    Ok(Json(outcome))
}

pub async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryModel>>, (StatusCode, Json<ApiError>)> {
    let models = state
        .inventory
        .list_active()
        .await
        .map_err(|error| repository_failure("inventory.list", error))?;

    Ok(Json(models))
}

/// Analytics over every visit: deterministic funnel + pipeline, static
/// objection reference content, and an optional model-written narrative.
pub async fn analytics_tab(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, (StatusCode, Json<ApiError>)> {
    let records = state
        .visits
        .list_all()
        .await
        .map_err(|error| repository_failure("visits.list_all", error))?;
    let visits: Vec<_> = records.iter().map(|record| record.visit.clone()).collect();
    let summary = analytics::summarize(&visits);

    let (narrative, narrative_error) = if query.narrative.unwrap_or(false) {
        let digest: Vec<DailyVisitorDigest> = records
            .iter()
            .map(|record| {
                let budget = budget_display(record.visit.budget_min, record.visit.budget_max);
                DailyVisitorDigest::new(
                    &record.visitor.name,
                    record.visit.stage,
                    budget.as_deref(),
                    record.visit.must_have.as_deref(),
                )
            })
            .collect();

        match summarize_day(state.generation.as_ref(), &digest).await {
            Ok(outcome) => (Some(outcome.summary), None),
            Err(error) => {
                warn!(
                    event_name = "analytics.narrative_degraded",
                    error = %error,
                    "daily narrative unavailable, serving summary only"
                );
                (None, Some("Narrative summary is unavailable right now.".to_string()))
            }
        }
    } else {
        (None, None)
    };

    Ok(Json(AnalyticsResponse {
        summary,
        objection_trends: OBJECTION_TRENDS.to_vec(),
        narrative,
        narrative_error,
    }))
}

/// Explicit administrative seed/reset. Requires the configured admin
/// token; when no token is configured the surface is disabled outright.
pub async fn admin_seed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SeedResponse>, (StatusCode, Json<ApiError>)> {
    let Some(expected) = &state.admin_token else {
        return Err(admin_forbidden("administrative seeding is disabled"));
    };

    let presented = headers
        .get("x-admin-token")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if presented != expected.expose_secret() {
        return Err(admin_forbidden("admin token mismatch"));
    }

    let result = ShowroomSeedDataset::load(&state.db_pool)
        .await
        .map_err(|error| repository_failure("admin.seed", error))?;
    let verification = ShowroomSeedDataset::verify(&state.db_pool)
        .await
        .map_err(|error| repository_failure("admin.seed_verify", error))?;

    info!(
        event_name = "admin.seed_loaded",
        models = result.models_seeded,
        visits = result.visits_seeded,
        verified = verification.all_passed(),
        "showroom seed dataset loaded"
    );

    Ok(Json(SeedResponse {
        models_seeded: result.models_seeded,
        visits_seeded: result.visits_seeded,
        verified: verification.all_passed(),
    }))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn budget_display(budget_min: i64, budget_max: Option<i64>) -> Option<String> {
    match (budget_min, budget_max) {
        (0, None) => None,
        (min, Some(max)) => Some(format!("${min} - ${max}")),
        (min, None) => Some(format!("${min}+")),
    }
}

fn visit_not_found() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: "visit not found".to_string(),
            correlation_id: new_correlation_id(),
        }),
    )
}

fn admin_forbidden(detail: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::FORBIDDEN,
        Json(ApiError { error: detail.to_string(), correlation_id: new_correlation_id() }),
    )
}

fn repository_failure(
    context: &'static str,
    error: RepositoryError,
) -> (StatusCode, Json<ApiError>) {
    let correlation_id = new_correlation_id();
    tracing::error!(
        event_name = "api.persistence_failure",
        context,
        correlation_id = %correlation_id,
        error = %error,
        "repository operation failed"
    );
    let interface = ApplicationError::Persistence(error.to_string())
        .into_interface(correlation_id.clone());
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError { error: interface.user_message().to_string(), correlation_id }),
    )
}

fn generation_failure(
    context: &'static str,
    error: GenerationError,
) -> (StatusCode, Json<ApiError>) {
    let correlation_id = new_correlation_id();
    warn!(
        event_name = "api.generation_failure",
        context,
        correlation_id = %correlation_id,
        error = %error,
        "generation flow failed"
    );
    let interface =
        ApplicationError::Generation(error.to_string()).into_interface(correlation_id.clone());
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError { error: interface.user_message().to_string(), correlation_id }),
    )
}
