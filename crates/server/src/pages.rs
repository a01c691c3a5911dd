//! Tera-rendered HTML pages for hosts on the sales floor.
//!
//! - `GET /visitor-intake` - the kiosk intake form
//! - `GET /dashboard`      - active visits / inventory / analytics tabs
//! - `GET /visitors/{id}`  - the tour page for one visit
//!
//! Pages read through the same repository traits as the JSON API; a
//! missing visit renders the dedicated not-found view rather than an
//! error page.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

use showhome_core::analytics::{self, OBJECTION_TRENDS};
use showhome_core::domain::visit::VisitId;

use crate::api::{AppState, VisitView};

/// Static reference content for the tour page; community data is not
/// computed anywhere.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct NeighborhoodInsight {
    pub title: &'static str,
    pub description: &'static str,
}

pub const NEIGHBORHOOD_INSIGHTS: [NeighborhoodInsight; 4] = [
    NeighborhoodInsight {
        title: "Top-Rated Schools",
        description: "Crestwood Elementary (9/10) and Northgate High (8/10) nearby.",
    },
    NeighborhoodInsight {
        title: "Green Spaces",
        description: "5 min walk to River Valley Park with trails and playgrounds.",
    },
    NeighborhoodInsight {
        title: "Shopping & Dining",
        description: "Edmonton City Centre mall is a 10-min drive away.",
    },
    NeighborhoodInsight {
        title: "Commute",
        description: "Easy access to LRT station, 20 mins to downtown.",
    },
];

/// Initialize the template engine with the web page templates.
pub fn templates() -> Arc<Tera> {
    let mut tera = match Tera::new("templates/web/**/*") {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "failed to load web templates from filesystem, using empty Tera instance");
            Tera::default()
        }
    };

    // Embedded fallbacks keep the pages working from any working directory.
    tera.add_raw_template("intake.html", include_str!("../../../templates/web/intake.html")).ok();
    tera.add_raw_template("dashboard.html", include_str!("../../../templates/web/dashboard.html"))
        .ok();
    tera.add_raw_template("tour.html", include_str!("../../../templates/web/tour.html")).ok();
    tera.add_raw_template("not_found.html", include_str!("../../../templates/web/not_found.html"))
        .ok();

    Arc::new(tera)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/visitor-intake", get(intake_page))
        .route("/dashboard", get(dashboard_page))
        .route("/visitors/{id}", get(tour_page))
        .with_state(state)
}

async fn intake_page(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let mut context = Context::new();
    context.insert("host_name", &state.default_host.name);
    render(&state.templates, "intake.html", &context)
}

async fn dashboard_page(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let active = state.visits.list_active().await.map_err(render_unavailable)?;
    let all = state.visits.list_all().await.map_err(render_unavailable)?;
    let inventory = state.inventory.list_active().await.map_err(render_unavailable)?;

    let visits: Vec<_> = all.iter().map(|record| record.visit.clone()).collect();
    let summary = analytics::summarize(&visits);

    let mut context = Context::new();
    context.insert("host_name", &state.default_host.name);
    context.insert(
        "active_visits",
        &active.iter().map(VisitView::from).collect::<Vec<_>>(),
    );
    context.insert("inventory", &inventory);
    context.insert("summary", &summary);
    context.insert("objection_trends", &OBJECTION_TRENDS.to_vec());
    render(&state.templates, "dashboard.html", &context)
}

async fn tour_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let visit_id = VisitId(id);
    let record = state.visits.find_by_id(&visit_id).await.map_err(render_unavailable)?;

    let Some(record) = record else {
        let body = state
            .templates
            .render("not_found.html", &Context::new())
            .unwrap_or_else(|_| "<h1>Visit not found</h1>".to_string());
        return Err((StatusCode::NOT_FOUND, Html(body)));
    };

    let photos = state.visits.list_photos(&visit_id).await.map_err(render_unavailable)?;
    let inventory = state.inventory.list_active().await.map_err(render_unavailable)?;

    let mut context = Context::new();
    context.insert("visit", &VisitView::from(&record));
    context.insert("photos", &photos);
    context.insert("inventory", &inventory);
    context.insert("neighborhood", &NEIGHBORHOOD_INSIGHTS.to_vec());
    render(&state.templates, "tour.html", &context)
}

fn render(
    templates: &Tera,
    name: &str,
    context: &Context,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    templates.render(name, context).map(Html).map_err(|error| {
        warn!(event_name = "pages.render_failure", template = name, error = %error, "template render failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Something went wrong rendering this page.</h1>".to_string()),
        )
    })
}

fn render_unavailable(
    error: showhome_db::repositories::RepositoryError,
) -> (StatusCode, Html<String>) {
    warn!(event_name = "pages.persistence_failure", error = %error, "page data load failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html("<h1>The showroom data store is temporarily unavailable.</h1>".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::Value;

    use showhome_agent::{GenerationClient, GenerationError, GenerationRequest};
    use showhome_core::domain::host::{Host, HostRole};
    use showhome_core::domain::visit::{NewVisit, VisitStage};
    use showhome_core::domain::visitor::NewVisitor;
    use showhome_db::repositories::{
        InMemoryInventoryRepository, InMemoryVisitRepository, VisitRepository,
    };
    use showhome_db::{connect_with_settings, migrations};

    use super::{dashboard_page, intake_page, tour_page};
    use crate::api::AppState;

    struct NoGeneration;

    #[async_trait]
    impl GenerationClient for NoGeneration {
        async fn generate_json(
            &self,
            _request: GenerationRequest,
        ) -> Result<Value, GenerationError> {
            Err(GenerationError::Transport("not wired in page tests".to_string()))
        }
    }

    async fn page_state() -> AppState {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        AppState {
            visits: Arc::new(InMemoryVisitRepository::new()),
            inventory: Arc::new(InMemoryInventoryRepository::default()),
            generation: Arc::new(NoGeneration),
            default_host: Host {
                id: "host-test-001".to_string(),
                name: "Sarah P.".to_string(),
                email: "sarah@example.com".to_string(),
                role: HostRole::Host,
                created_at: Utc::now(),
            },
            admin_token: None,
            db_pool: pool,
            templates: super::templates(),
        }
    }

    #[tokio::test]
    async fn intake_page_renders_the_form() {
        let state = page_state().await;
        let page = intake_page(State(state)).await.expect("render").0;

        assert!(page.contains("What's your name?"));
        assert!(page.contains("/api/v1/intake"));
    }

    #[tokio::test]
    async fn dashboard_lists_active_visits_and_summary() {
        let state = page_state().await;
        state
            .visits
            .create_intake(
                NewVisitor { name: "The Miller Family".to_string(), email: None, phone: None },
                NewVisit {
                    stage: Some(VisitStage::HotNow),
                    budget_min: 650_000,
                    budget_max: Some(750_000),
                    timeline: Some("3-6".to_string()),
                    must_have: None,
                },
                None,
            )
            .await
            .expect("create");

        let page = dashboard_page(State(state)).await.expect("render").0;

        assert!(page.contains("The Miller Family"));
        assert!(page.contains("Hot Now"));
        assert!(page.contains("Pipeline"));
    }

    #[tokio::test]
    async fn unknown_visit_renders_the_not_found_view() {
        let state = page_state().await;

        let (status, body) = tour_page(State(state), Path("missing".to_string()))
            .await
            .expect_err("should be not found");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.0.contains("not") && body.0.to_lowercase().contains("found"));
    }

    #[tokio::test]
    async fn tour_page_shows_visitor_and_neighborhood_content() {
        let state = page_state().await;
        let created = state
            .visits
            .create_intake(
                NewVisitor { name: "Dr. Evelyn Reed".to_string(), email: None, phone: None },
                NewVisit {
                    stage: Some(VisitStage::JustLooking),
                    budget_min: 800_000,
                    budget_max: None,
                    timeline: Some(">12".to_string()),
                    must_have: Some("quiet home office".to_string()),
                },
                None,
            )
            .await
            .expect("create");

        let page = tour_page(State(state), Path(created.visit.id.0))
            .await
            .expect("render")
            .0;

        assert!(page.contains("Dr. Evelyn Reed"));
        assert!(page.contains("Neighborhood Insights"));
        assert!(page.contains("quiet home office"));
    }
}
