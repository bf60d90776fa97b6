//! Structured application errors that render as response envelopes.

use crate::codes::Code;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;

/// Well-known string codes for [`ApiError`].
#[allow(missing_docs)]
pub mod kind {
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const CANCELLED: &str = "CANCELLED";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";
    pub const FAILED_PRECONDITION: &str = "FAILED_PRECONDITION";
    pub const ABORTED: &str = "ABORTED";
    pub const OUT_OF_RANGE: &str = "OUT_OF_RANGE";
    pub const UNIMPLEMENTED: &str = "UNIMPLEMENTED";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    pub const DATA_LOSS: &str = "DATA_LOSS";

    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const ACCOUNT_LOCKED: &str = "ACCOUNT_LOCKED";
    pub const ACCOUNT_DISABLED: &str = "ACCOUNT_DISABLED";
    pub const EMAIL_NOT_VERIFIED: &str = "EMAIL_NOT_VERIFIED";
    pub const PHONE_NOT_VERIFIED: &str = "PHONE_NOT_VERIFIED";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";

    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DUPLICATE_KEY: &str = "DUPLICATE_KEY";

    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";

    pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";
    pub const FILE_TOO_LARGE: &str = "FILE_TOO_LARGE";
    pub const INVALID_FILE_TYPE: &str = "INVALID_FILE_TYPE";
    pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";

    pub const THIRD_PARTY_ERROR: &str = "THIRD_PARTY_ERROR";
    pub const API_ERROR: &str = "API_ERROR";

    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const MISSING_CONFIG: &str = "MISSING_CONFIG";
    pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
}

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// An application error with a string code, a human message, optional
/// structured details and an optional underlying cause.
#[derive(Debug)]
pub struct ApiError {
    code: String,
    message: String,
    details: Option<Value>,
    cause: Option<Cause>,
    timestamp: DateTime<Utc>,
}

impl ApiError {
    /// Creates an error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            cause: None,
            timestamp: Utc::now(),
        }
    }

    /// Wraps `cause` under a new code and message.
    pub fn wrap(
        cause: impl Into<Cause>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, message).with_cause(cause)
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches an underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(kind::INTERNAL_ERROR, message)
    }

    /// Invalid argument.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(kind::INVALID_ARGUMENT, message)
    }

    /// Missing resource.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(kind::NOT_FOUND, message)
    }

    /// Caller lacks permission.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(kind::PERMISSION_DENIED, message)
    }

    /// Input failed validation.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(kind::VALIDATION_ERROR, message)
    }

    /// String code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured details, if any.
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Underlying cause, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// When the error was created.
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether this error carries `code`.
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// Numeric response code corresponding to this error's string code.
    pub fn response_code(&self) -> Code {
        match self.code.as_str() {
            kind::INVALID_ARGUMENT | kind::VALIDATION_ERROR | kind::OUT_OF_RANGE => {
                Code::INVALID_PARAM
            }
            kind::NOT_FOUND => Code::NOT_FOUND,
            kind::PERMISSION_DENIED => Code::PERMISSION_DENIED,
            kind::UNAUTHENTICATED => Code::UNAUTHORIZED,
            kind::TIMEOUT | kind::REQUEST_TIMEOUT => Code::REQUEST_TIMEOUT,
            kind::ALREADY_EXISTS | kind::DUPLICATE_KEY => Code::CONFLICT,
            kind::RESOURCE_EXHAUSTED => Code::RESOURCE_EXHAUSTED,
            kind::RATE_LIMITED => Code::RATE_LIMITED,
            kind::USER_NOT_FOUND => Code::USER_NOT_FOUND,
            kind::INVALID_CREDENTIALS => Code::INVALID_PASSWORD,
            kind::ACCOUNT_LOCKED => Code::ACCOUNT_LOCKED,
            kind::ACCOUNT_DISABLED => Code::ACCOUNT_DISABLED,
            kind::EMAIL_NOT_VERIFIED => Code::EMAIL_NOT_VERIFIED,
            kind::PHONE_NOT_VERIFIED => Code::PHONE_NOT_VERIFIED,
            kind::INVALID_TOKEN => Code::TOKEN_INVALID,
            kind::TOKEN_EXPIRED => Code::TOKEN_EXPIRED,
            kind::FILE_NOT_FOUND => Code::FILE_NOT_FOUND,
            kind::FILE_TOO_LARGE => Code::FILE_TOO_LARGE,
            kind::INVALID_FILE_TYPE => Code::FILE_TYPE_INVALID,
            kind::UPLOAD_FAILED => Code::UPLOAD_FAILED,
            kind::STORAGE_ERROR => Code::STORAGE_EXHAUSTED,
            kind::NETWORK_ERROR => Code::NETWORK_ERROR,
            kind::SERVICE_UNAVAILABLE | kind::UNAVAILABLE => Code::SERVICE_UNAVAILABLE,
            kind::THIRD_PARTY_ERROR => Code::THIRD_PARTY_ERROR,
            kind::API_ERROR => Code::EXTERNAL_API_ERROR,
            kind::DATABASE_ERROR | kind::CONNECTION_ERROR => Code::DATABASE_ERROR,
            kind::CONFIG_ERROR | kind::MISSING_CONFIG | kind::INVALID_CONFIG => {
                Code::CONFIGURATION_ERROR
            }
            _ => Code::INTERNAL_ERROR,
        }
    }

    /// Serializable view used as the `data` of an error envelope.
    pub fn body(&self) -> ApiErrorBody {
        ApiErrorBody {
            code: self.code.clone(),
            message: self.message.clone(),
            details: self.details.clone(),
            cause: self.cause.as_ref().map(ToString::to_string),
            timestamp: self.timestamp,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl From<parlance_common::ParlanceError> for ApiError {
    fn from(err: parlance_common::ParlanceError) -> Self {
        use parlance_common::ParlanceError;

        let code = match &err {
            ParlanceError::Config { .. } => kind::CONFIG_ERROR,
            ParlanceError::Validation { .. } => kind::VALIDATION_ERROR,
            ParlanceError::Io { .. } => kind::STORAGE_ERROR,
            _ => kind::INTERNAL_ERROR,
        };
        let message = err.to_string();
        Self::wrap(err, code, message)
    }
}

/// JSON shape of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiErrorBody {
    /// String code.
    pub code: String,
    /// Human message.
    pub message: String,
    /// Structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Rendered cause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}
