pub mod authenticator;
pub mod orchestrator;
pub mod session;
pub mod sessions_actor;
pub mod translator;

pub use authenticator::Authenticator;
pub use orchestrator::{Notice, NoticeKind, Orchestrator, Render, UiState};
pub use session::{Session, SessionId};
pub use sessions_actor::SessionsHandle;
pub use translator::SqlTranslator;
