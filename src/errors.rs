// Error taxonomy for the auth flow
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static RE_ORIGIN_REJECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(cors|cross[- ]origin|origin not allowed)\b").unwrap());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Empty or malformed form input, caught before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is not approved yet")]
    NotApproved,

    #[error("email address is already registered")]
    EmailInUse,

    /// No valid session (missing, expired or revoked token).
    #[error("not authenticated")]
    Unauthenticated,

    #[error("request rejected by the origin policy of the auth service")]
    CrossOrigin,

    #[error("auth service unreachable: {0}")]
    Unreachable(String),

    #[error("auth service timed out")]
    Timeout,

    #[error("malformed response from auth service: {0}")]
    Malformed(String),

    #[error("auth service answered {status}: {message}")]
    Unexpected { status: u16, message: String },
}

/// Which backend call produced a failure; 401 means different things per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthCall {
    Login,
    Logout,
    CurrentIdentity,
    Register,
}

impl AuthError {
    /// Map a non-2xx backend answer to a typed error.
    pub fn from_status(call: AuthCall, status: u16, message: &str) -> Self {
        match (status, call) {
            (401, AuthCall::Login) => AuthError::InvalidCredentials,
            (401, _) => AuthError::Unauthenticated,
            (403, _) if RE_ORIGIN_REJECTION.is_match(message) => AuthError::CrossOrigin,
            (403, AuthCall::Login) => AuthError::NotApproved,
            (403, AuthCall::CurrentIdentity) => AuthError::Unauthenticated,
            (409, AuthCall::Register) => AuthError::EmailInUse,
            _ => AuthError::Unexpected {
                status,
                message: message.to_string(),
            },
        }
    }

    /// Transport failure as opposed to a definite answer from the backend.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AuthError::Unreachable(_)
                | AuthError::Timeout
                | AuthError::Malformed(_)
                | AuthError::CrossOrigin
                | AuthError::Unexpected { .. }
        )
    }

    /// Text shown inline next to the login or registration form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(msg) => msg.clone(),
            AuthError::InvalidCredentials => "Invalid email or password.".into(),
            AuthError::NotApproved => {
                "Your account is awaiting approval. We will email you once an admin has reviewed it."
                    .into()
            }
            AuthError::EmailInUse => "An account with this email already exists.".into(),
            AuthError::Unauthenticated => "Your session has expired. Please sign in again.".into(),
            AuthError::CrossOrigin => {
                "The portal is not allowed to reach the account service from this address. Please contact us."
                    .into()
            }
            AuthError::Unreachable(_) | AuthError::Timeout => {
                "Cannot reach the account service. Check your connection and try again.".into()
            }
            AuthError::Malformed(_) | AuthError::Unexpected { .. } => {
                "Something went wrong on our side. Please try again in a moment.".into()
            }
        }
    }

    /// HTTP status used when re-rendering a form with this error.
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::InvalidCredentials | AuthError::Unauthenticated => 401,
            AuthError::NotApproved | AuthError::CrossOrigin => 403,
            AuthError::EmailInUse => 409,
            AuthError::Timeout => 504,
            AuthError::Unreachable(_) | AuthError::Malformed(_) | AuthError::Unexpected { .. } => 502,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else if err.is_decode() {
            AuthError::Malformed(err.to_string())
        } else {
            AuthError::Unreachable(err.to_string())
        }
    }
}
