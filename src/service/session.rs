use uuid::Uuid;

pub type SessionId = Uuid;

/// Per-browser state: the login flag and the current question/SQL pair.
///
/// Only [`Authenticator`](crate::service::authenticator::Authenticator) sets
/// `authenticated`; the result table is never kept here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub(crate) authenticated: bool,
    pub question: String,
    pub generated_sql: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Replace the query pair wholesale with a fresh question.
    pub fn start_question(&mut self, question: &str) {
        self.question = question.to_string();
        self.generated_sql = None;
    }
}
