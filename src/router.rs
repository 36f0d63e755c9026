use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;

use crate::handlers::page::{
    generate_handler, health_handler, index_handler, login_handler, logout_handler, run_handler,
};
use crate::service::{Orchestrator, SessionsHandle};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AssistantState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: SessionsHandle,
    pub secure_cookie: bool,
    key: Key,
}

impl AssistantState {
    pub fn new(
        orchestrator: Orchestrator,
        sessions: SessionsHandle,
        key: Key,
        secure_cookie: bool,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sessions,
            secure_cookie,
            key,
        }
    }
}

impl FromRef<AssistantState> for Key {
    fn from_ref(state: &AssistantState) -> Self {
        state.key.clone()
    }
}

pub fn assistant_router(state: AssistantState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/login", post(login_handler))
        .route("/generate", post(generate_handler))
        .route("/run", post(run_handler))
        .route("/logout", post(logout_handler))
        .route("/healthz", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
