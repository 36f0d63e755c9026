use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use uuid::Uuid;

use crate::router::AssistantState;
use crate::service::{Session, SessionId, SessionsHandle};

pub const SESSION_COOKIE: &str = "askdb_session";

/// The caller's session, resolved from the encrypted session cookie.
///
/// A missing or undecryptable cookie starts a new logged-out session; the
/// cookie is issued with the response. Handlers mutate `session` and hand it
/// back through [`respond`](Self::respond) or [`end`](Self::end).
///
/// Nothing is stored server-side for a visitor until their session differs
/// from the logged-out default.
pub struct SessionContext {
    pub id: SessionId,
    pub session: Session,
    /// Whether the sessions actor held this id when the request started.
    known: bool,
    jar: PrivateCookieJar,
    sessions: SessionsHandle,
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
    AssistantState: FromRef<S>,
    Key: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AssistantState::from_ref(state);
        let Ok(jar) = PrivateCookieJar::<Key>::from_request_parts(parts, state).await;

        let existing = jar
            .get(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok());
        let (id, jar) = match existing {
            Some(id) => (id, jar),
            None => {
                let id = Uuid::new_v4();
                let jar = jar.add(build_cookie(id.to_string(), app.secure_cookie));
                (id, jar)
            }
        };

        let stored = app
            .sessions
            .load(id)
            .await
            .map_err(IntoResponse::into_response)?;

        Ok(Self {
            id,
            known: stored.is_some(),
            session: stored.unwrap_or_default(),
            jar,
            sessions: app.sessions.clone(),
        })
    }
}

impl SessionContext {
    /// Persist the session and send `html` along with the cookie jar.
    ///
    /// A session removed while this request was running stays removed.
    pub fn respond(self, html: String) -> Response {
        if self.known {
            self.sessions.update(self.id, self.session);
        } else if self.session != Session::default() {
            self.sessions.create(self.id, self.session);
        }
        (self.jar, Html(html)).into_response()
    }

    /// Drop the session server-side and expire its cookie.
    pub fn end(self, html: String) -> Response {
        self.sessions.remove(self.id);
        let jar = self.jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
        (jar, Html(html)).into_response()
    }
}

/// Browser-session cookie: no max-age, gone when the browser session ends.
fn build_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TextModel;
    use crate::db::{QueryGateway, ResultTable};
    use crate::error::AskDbError;
    use crate::router::assistant_router;
    use crate::service::{Authenticator, Orchestrator, SqlTranslator, sessions_actor};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct NoModel;

    #[async_trait]
    impl TextModel for NoModel {
        fn model_name(&self) -> &str {
            "none"
        }

        async fn generate_text(&self, _prompt: &str) -> Result<String, AskDbError> {
            Err(AskDbError::EmptyCompletion("none".into()))
        }
    }

    struct NoDatabase;

    #[async_trait]
    impl QueryGateway for NoDatabase {
        async fn run_query(&self, _sql: &str) -> Result<ResultTable, AskDbError> {
            Err(AskDbError::Config("POSTGRES_HOST".into()))
        }
    }

    async fn app() -> (axum::Router, SessionsHandle) {
        let orchestrator = Orchestrator::new(
            Authenticator::new(bcrypt::hash("letmein", 4).unwrap()),
            SqlTranslator::new(Arc::new(NoModel)),
            Arc::new(NoDatabase),
        );
        let sessions = sessions_actor::spawn(Duration::from_secs(3600))
            .await
            .unwrap();
        let state = AssistantState::new(orchestrator, sessions.clone(), Key::generate(), false);
        (assistant_router(state, 4096), sessions)
    }

    fn login(password: &str) -> Request<Body> {
        Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("password={password}")))
            .unwrap()
    }

    #[tokio::test]
    async fn anonymous_visits_leave_no_sessions_behind() {
        let (app, sessions) = app().await;

        for _ in 0..10 {
            let resp = app
                .clone()
                .oneshot(Request::get("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().contains_key(header::SET_COOKIE));
        }
        let resp = app.clone().oneshot(login("wrong")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(sessions.live_sessions().await, 0);

        let resp = app.clone().oneshot(login("letmein")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(sessions.live_sessions().await, 1);
    }
}
