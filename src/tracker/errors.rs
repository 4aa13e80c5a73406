use thiserror::Error;

/// Failures talking to the issue tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Transport level failure: DNS, TLS, connection reset, timeout.
    #[error("network error: {0}")]
    Network(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other 4xx/5xx answer from the server.
    #[error("server responded with HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("invalid response from tracker: {0}")]
    InvalidResponse(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("tracker configuration error: {0}")]
    Config(String),

    #[error("fix version of {issue_key} is already set to: {versions:?}")]
    FixVersionAlreadySet {
        issue_key: String,
        versions: Vec<String>,
    },
}

impl TrackerError {
    /// Short hint printed under the error by the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            TrackerError::Network(_) => {
                Some("check connectivity to the Jira server and JIRA_SERVER_URL")
            }
            TrackerError::Server { status: 401, .. } => {
                Some("credentials were rejected, run: jira-cli login")
            }
            TrackerError::Server { status: 403, .. } => {
                Some("the user lacks permission for this operation")
            }
            TrackerError::NotFound(_) => Some("check the issue, project or version key"),
            TrackerError::Config(_) => Some("run: jira-cli login"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TrackerError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            TrackerError::Server {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            TrackerError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::InvalidResponse(err.to_string())
    }
}
