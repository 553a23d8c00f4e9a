use serde_json::{Value, json};
use thiserror::Error;

/// Failure categories surfaced to every context. The display form is the
/// diagnostic text; `user_message` is the short line a UI shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BriefError {
    #[error("{0}")]
    UserInput(String),
    #[error("summarization service unreachable: {0}")]
    Transport(String),
    #[error("request rejected: {0}")]
    Application(String),
    #[error("could not access page content: {0}")]
    PageAccess(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserInput,
    Transport,
    Application,
    PageAccess,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserInput => "user_input",
            Self::Transport => "transport",
            Self::Application => "application",
            Self::PageAccess => "page_access",
            Self::Internal => "internal",
        }
    }
}

impl BriefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserInput(_) => ErrorKind::UserInput,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Application(_) => ErrorKind::Application,
            Self::PageAccess(_) => ErrorKind::PageAccess,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::UserInput(msg) => msg.clone(),
            Self::Transport(_) => {
                "Summarization server is not running. Start it and try again.".to_string()
            }
            Self::Application(detail) => format!("Request rejected: {detail}"),
            Self::PageAccess(_) => "Could not access page content.".to_string(),
            Self::Internal(_) => "Something went wrong. Try again.".to_string(),
        }
    }

    pub fn to_response(&self) -> Value {
        json!({
            "error": self.user_message(),
            "kind": self.kind().as_str(),
            "detail": self.to_string(),
        })
    }
}

impl From<anyhow::Error> for BriefError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_application_render_distinct_messages() {
        let down = BriefError::Transport("connection refused".into());
        let rejected = BriefError::Application("text too short".into());
        assert!(down.user_message().contains("not running"));
        assert_eq!(rejected.user_message(), "Request rejected: text too short");
    }

    #[test]
    fn response_carries_kind_tag() {
        let resp = BriefError::PageAccess("chrome://settings".into()).to_response();
        assert_eq!(resp["kind"], "page_access");
        assert_eq!(resp["error"], "Could not access page content.");
    }
}
