use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::middleware::SessionContext;
use crate::router::AssistantState;
use crate::view::render_page;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub question: String,
}

/// GET / -> page for the current session state.
pub async fn index_handler(State(state): State<AssistantState>, ctx: SessionContext) -> Response {
    let render = state.orchestrator.current(&ctx.session);
    ctx.respond(render_page(&render))
}

/// POST /login
pub async fn login_handler(
    State(state): State<AssistantState>,
    mut ctx: SessionContext,
    Form(form): Form<LoginForm>,
) -> Response {
    let render = state.orchestrator.login(&mut ctx.session, &form.password).await;
    ctx.respond(render_page(&render))
}

/// POST /generate
pub async fn generate_handler(
    State(state): State<AssistantState>,
    mut ctx: SessionContext,
    Form(form): Form<QuestionForm>,
) -> Response {
    debug!(session = %ctx.id, "generate requested");
    let render = state
        .orchestrator
        .generate(&mut ctx.session, &form.question)
        .await;
    ctx.respond(render_page(&render))
}

/// POST /run
pub async fn run_handler(State(state): State<AssistantState>, ctx: SessionContext) -> Response {
    debug!(session = %ctx.id, "run requested");
    let render = state.orchestrator.run(&ctx.session).await;
    ctx.respond(render_page(&render))
}

/// POST /logout
pub async fn logout_handler(
    State(state): State<AssistantState>,
    mut ctx: SessionContext,
) -> Response {
    let render = state.orchestrator.logout(&mut ctx.session);
    ctx.end(render_page(&render))
}

/// GET /healthz
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}
