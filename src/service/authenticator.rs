use tracing::{error, info, warn};

use crate::error::AskDbError;
use crate::service::session::Session;

/// Single shared password checked against a bcrypt hash.
#[derive(Clone)]
pub struct Authenticator {
    hashed_password: String,
}

impl Authenticator {
    pub fn new(hashed_password: impl Into<String>) -> Self {
        Self {
            hashed_password: hashed_password.into(),
        }
    }

    /// Verify `candidate` and flag the session on success.
    ///
    /// A hash that bcrypt cannot parse counts as a failed login.
    pub async fn authenticate(&self, session: &mut Session, candidate: &str) -> bool {
        match self.verify(candidate).await {
            Ok(true) => {
                session.authenticated = true;
                info!("login succeeded");
                true
            }
            Ok(false) => {
                warn!("login rejected: incorrect password");
                false
            }
            Err(e) => {
                error!(error = %e, "password verification failed");
                false
            }
        }
    }

    /// bcrypt is CPU-bound; run it off the async workers.
    async fn verify(&self, candidate: &str) -> Result<bool, AskDbError> {
        let candidate = candidate.to_string();
        let hash = self.hashed_password.clone();
        tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash))
            .await
            .map_err(|e| AskDbError::TaskFailed(format!("password verification: {e}")))?
            .map_err(AskDbError::from)
    }
}

/// Gate for every action past the login form.
pub fn require_authenticated(session: &Session) -> Result<(), AskDbError> {
    if session.authenticated {
        Ok(())
    } else {
        Err(AskDbError::AuthFailure)
    }
}
