//! Page state machine.
//!
//! ```text
//! LoggedOut --login ok--> Idle --generate--> SqlGenerated --run--> ResultShown
//! ```
//!
//! Every handler takes the caller's [`Session`], applies one event and returns
//! the [`Render`] for the resulting state. Failures of the external calls are
//! turned into a [`Notice`] here and never propagate further.

use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{QueryGateway, ResultTable};
use crate::error::AskDbError;
use crate::service::authenticator::{Authenticator, require_authenticated};
use crate::service::session::Session;
use crate::service::translator::SqlTranslator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    LoggedOut,
    Idle,
    SqlGenerated { sql: String },
    ResultShown { sql: String, table: ResultTable },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

/// Everything the page needs for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    pub state: UiState,
    pub question: String,
    pub notice: Option<Notice>,
}

impl Render {
    fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

pub struct Orchestrator {
    authenticator: Authenticator,
    translator: SqlTranslator,
    gateway: Arc<dyn QueryGateway>,
}

impl Orchestrator {
    pub fn new(
        authenticator: Authenticator,
        translator: SqlTranslator,
        gateway: Arc<dyn QueryGateway>,
    ) -> Self {
        Self {
            authenticator,
            translator,
            gateway,
        }
    }

    /// Render without applying any event.
    pub fn current(&self, session: &Session) -> Render {
        if !session.is_authenticated() {
            return login_form();
        }
        let state = match &session.generated_sql {
            Some(sql) => UiState::SqlGenerated { sql: sql.clone() },
            None => UiState::Idle,
        };
        Render {
            state,
            question: session.question.clone(),
            notice: None,
        }
    }

    pub async fn login(&self, session: &mut Session, password: &str) -> Render {
        if session.is_authenticated() {
            return self.current(session);
        }
        if self.authenticator.authenticate(session, password).await {
            self.current(session)
        } else {
            login_form().with_notice(Notice::error(AskDbError::AuthFailure.user_message()))
        }
    }

    /// "Generate SQL". A blank question leaves the session untouched.
    pub async fn generate(&self, session: &mut Session, question: &str) -> Render {
        if require_authenticated(session).is_err() {
            return login_form();
        }
        if question.trim().is_empty() {
            return self.current(session);
        }

        session.start_question(question);
        match self.translator.generate_sql(question).await {
            Ok(sql) => {
                session.generated_sql = Some(sql);
                self.current(session)
            }
            Err(e) => self.current(session).with_notice(Notice::error(e.user_message())),
        }
    }

    /// "Run Query" against the SQL generated for the current question.
    pub async fn run(&self, session: &Session) -> Render {
        if require_authenticated(session).is_err() {
            return login_form();
        }
        let Some(sql) = session.generated_sql.clone() else {
            return self.current(session);
        };

        match self.gateway.run_query(&sql).await {
            Ok(table) => {
                info!(rows = table.row_count(), "query returned");
                let notice = table
                    .is_empty()
                    .then(|| Notice::info("Query returned no rows."));
                Render {
                    state: UiState::ResultShown { sql, table },
                    question: session.question.clone(),
                    notice,
                }
            }
            Err(e) => {
                warn!(error = %e, "query failed");
                self.current(session).with_notice(Notice::error(e.user_message()))
            }
        }
    }

    pub fn logout(&self, session: &mut Session) -> Render {
        *session = Session::default();
        info!("logged out");
        login_form()
    }
}

fn login_form() -> Render {
    Render {
        state: UiState::LoggedOut,
        question: String::new(),
        notice: None,
    }
}
