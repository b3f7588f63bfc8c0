/// Errors raised at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable bearer token in the session.
    #[error("not signed in: no access token found")]
    MissingToken,

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body did not match the expected response schema.
    #[error("response from {path} did not match the expected schema: {message}")]
    Schema { path: String, message: String },

    /// A 2xx response whose envelope reports an error.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("{resource} must be scoped to a cohort (pass --cohort)")]
    MissingScope { resource: &'static str },

    #[error("{resource} rows cannot be deleted")]
    ReadOnly { resource: &'static str },
}

impl ApiError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when signing in again is the likely fix.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingToken) || matches!(self.status_code(), Some(401 | 403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_covers_missing_token_and_auth_statuses() {
        assert!(ApiError::MissingToken.is_unauthorized());
        assert!(ApiError::http(401, "Unauthenticated.").is_unauthorized());
        assert!(ApiError::http(403, "Forbidden").is_unauthorized());
        assert!(!ApiError::http(500, "Server Error").is_unauthorized());
        assert!(!ApiError::Rejected("bad".to_string()).is_unauthorized());
    }

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(
            ApiError::http(422, "The email has already been taken.").to_string(),
            "HTTP 422: The email has already been taken."
        );
        assert_eq!(
            ApiError::MissingScope { resource: "schedules" }.to_string(),
            "schedules must be scoped to a cohort (pass --cohort)"
        );
        assert_eq!(
            ApiError::ReadOnly { resource: "waitlist" }.to_string(),
            "waitlist rows cannot be deleted"
        );
    }
}
