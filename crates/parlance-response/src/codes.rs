//! Numeric response codes and the registry mapping them to message ids and
//! HTTP statuses.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Message id returned for codes the registry does not know.
pub const UNKNOWN_ERROR_MESSAGE: &str = "UNKNOWN_ERROR";

/// HTTP status returned for codes without a registered status.
pub const DEFAULT_HTTP_STATUS: u16 = 200;

/// Application-level response code carried in every envelope.
///
/// `0` is success; 1000-1999 are client errors and 2000-2999 server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(pub i32);

#[allow(missing_docs)]
impl Code {
    pub const SUCCESS: Self = Self(0);

    pub const INVALID_PARAM: Self = Self(1001);
    pub const MISSING_PARAM: Self = Self(1002);
    pub const INVALID_FORMAT: Self = Self(1003);
    pub const UNAUTHORIZED: Self = Self(1004);
    pub const FORBIDDEN: Self = Self(1005);
    pub const NOT_FOUND: Self = Self(1006);
    pub const CONFLICT: Self = Self(1007);
    pub const TOO_MANY_REQUESTS: Self = Self(1008);
    pub const REQUEST_TIMEOUT: Self = Self(1009);

    pub const USER_NOT_FOUND: Self = Self(1101);
    pub const USER_EXISTS: Self = Self(1102);
    pub const INVALID_PASSWORD: Self = Self(1103);
    pub const ACCOUNT_LOCKED: Self = Self(1104);
    pub const ACCOUNT_DISABLED: Self = Self(1105);
    pub const EMAIL_NOT_VERIFIED: Self = Self(1106);
    pub const PHONE_NOT_VERIFIED: Self = Self(1107);

    pub const TOKEN_INVALID: Self = Self(1201);
    pub const TOKEN_EXPIRED: Self = Self(1202);
    pub const REFRESH_TOKEN_ERROR: Self = Self(1203);
    pub const LOGIN_REQUIRED: Self = Self(1204);
    pub const PERMISSION_DENIED: Self = Self(1205);
    pub const SESSION_EXPIRED: Self = Self(1206);

    pub const BUSINESS_ERROR: Self = Self(1301);
    pub const DATA_CONFLICT: Self = Self(1302);
    pub const OPERATION_FAILED: Self = Self(1303);
    pub const RESOURCE_EXHAUSTED: Self = Self(1304);
    pub const QUOTA_EXCEEDED: Self = Self(1305);
    pub const RATE_LIMITED: Self = Self(1306);

    pub const FILE_NOT_FOUND: Self = Self(1401);
    pub const FILE_TOO_LARGE: Self = Self(1402);
    pub const FILE_TYPE_INVALID: Self = Self(1403);
    pub const UPLOAD_FAILED: Self = Self(1404);
    pub const DOWNLOAD_FAILED: Self = Self(1405);
    pub const STORAGE_EXHAUSTED: Self = Self(1406);

    pub const THIRD_PARTY_ERROR: Self = Self(1501);
    pub const SERVICE_UNAVAILABLE: Self = Self(1502);
    pub const EXTERNAL_API_ERROR: Self = Self(1503);
    pub const NETWORK_ERROR: Self = Self(1504);
    pub const TIMEOUT_ERROR: Self = Self(1505);

    pub const INTERNAL_ERROR: Self = Self(2001);
    pub const DATABASE_ERROR: Self = Self(2002);
    pub const SERVICE_ERROR: Self = Self(2003);
    pub const CONFIGURATION_ERROR: Self = Self(2004);
    pub const DEPENDENCY_ERROR: Self = Self(2005);
    pub const SYSTEM_ERROR: Self = Self(2006);
    pub const MAINTENANCE_MODE: Self = Self(2007);

    pub const UNKNOWN_ERROR: Self = Self(9999);
}

impl Code {
    /// Whether this is the success code.
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Whether this is any non-success code.
    pub const fn is_error(self) -> bool {
        !self.is_success()
    }

    /// Codes 1000-1999.
    pub const fn is_client_error(self) -> bool {
        self.0 >= 1000 && self.0 < 2000
    }

    /// Codes 2000-2999.
    pub const fn is_server_error(self) -> bool {
        self.0 >= 2000 && self.0 < 3000
    }

    /// Broad classification of this code.
    pub const fn category(self) -> CodeCategory {
        if self.is_success() {
            CodeCategory::Success
        } else if self.is_client_error() {
            CodeCategory::ClientError
        } else if self.is_server_error() {
            CodeCategory::ServerError
        } else {
            CodeCategory::Error
        }
    }

    /// Whether this code is part of the built-in table.
    pub fn is_builtin(self) -> bool {
        builtin(self).is_some()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i32> for Code {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Broad classification of a [`Code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeCategory {
    /// The success code.
    Success,
    /// 1000-1999.
    ClientError,
    /// 2000-2999.
    ServerError,
    /// Any other error code.
    Error,
}

impl fmt::Display for CodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::Error => "error",
        };
        f.pad(name)
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDefinition {
    /// The code.
    pub code: Code,
    /// Message id translated into the envelope's `message`.
    pub message: String,
    /// HTTP status sent with the envelope.
    pub http_status: u16,
}

impl CodeDefinition {
    /// Creates a definition.
    pub fn new(code: impl Into<Code>, message: impl Into<String>, http_status: u16) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            http_status,
        }
    }
}

/// Built-in codes: `(code, message id, HTTP status)`.
pub const BUILTIN_CODES: &[(Code, &str, u16)] = &[
    (Code::SUCCESS, "SUCCESS", 200),
    (Code::INVALID_PARAM, "INVALID_PARAM", 400),
    (Code::MISSING_PARAM, "MISSING_PARAM", 400),
    (Code::INVALID_FORMAT, "INVALID_FORMAT", 400),
    (Code::UNAUTHORIZED, "UNAUTHORIZED", 401),
    (Code::FORBIDDEN, "FORBIDDEN", 403),
    (Code::NOT_FOUND, "NOT_FOUND", 404),
    (Code::CONFLICT, "CONFLICT", 409),
    (Code::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS", 429),
    (Code::REQUEST_TIMEOUT, "REQUEST_TIMEOUT", 408),
    (Code::USER_NOT_FOUND, "USER_NOT_FOUND", 404),
    (Code::USER_EXISTS, "USER_EXISTS", 409),
    (Code::INVALID_PASSWORD, "INVALID_PASSWORD", 401),
    (Code::ACCOUNT_LOCKED, "ACCOUNT_LOCKED", 423),
    (Code::ACCOUNT_DISABLED, "ACCOUNT_DISABLED", 403),
    (Code::EMAIL_NOT_VERIFIED, "EMAIL_NOT_VERIFIED", 403),
    (Code::PHONE_NOT_VERIFIED, "PHONE_NOT_VERIFIED", 403),
    (Code::TOKEN_INVALID, "TOKEN_INVALID", 401),
    (Code::TOKEN_EXPIRED, "TOKEN_EXPIRED", 401),
    (Code::REFRESH_TOKEN_ERROR, "REFRESH_TOKEN_ERROR", 401),
    (Code::LOGIN_REQUIRED, "LOGIN_REQUIRED", 401),
    (Code::PERMISSION_DENIED, "PERMISSION_DENIED", 403),
    (Code::SESSION_EXPIRED, "SESSION_EXPIRED", 401),
    (Code::BUSINESS_ERROR, "BUSINESS_ERROR", 422),
    (Code::DATA_CONFLICT, "DATA_CONFLICT", 409),
    (Code::OPERATION_FAILED, "OPERATION_FAILED", 422),
    (Code::RESOURCE_EXHAUSTED, "RESOURCE_EXHAUSTED", 429),
    (Code::QUOTA_EXCEEDED, "QUOTA_EXCEEDED", 429),
    (Code::RATE_LIMITED, "RATE_LIMITED", 429),
    (Code::FILE_NOT_FOUND, "FILE_NOT_FOUND", 404),
    (Code::FILE_TOO_LARGE, "FILE_TOO_LARGE", 413),
    (Code::FILE_TYPE_INVALID, "FILE_TYPE_INVALID", 400),
    (Code::UPLOAD_FAILED, "UPLOAD_FAILED", 422),
    (Code::DOWNLOAD_FAILED, "DOWNLOAD_FAILED", 500),
    (Code::STORAGE_EXHAUSTED, "STORAGE_EXHAUSTED", 507),
    (Code::THIRD_PARTY_ERROR, "THIRD_PARTY_ERROR", 502),
    (Code::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", 503),
    (Code::EXTERNAL_API_ERROR, "EXTERNAL_API_ERROR", 502),
    (Code::NETWORK_ERROR, "NETWORK_ERROR", 503),
    (Code::TIMEOUT_ERROR, "TIMEOUT_ERROR", 504),
    (Code::INTERNAL_ERROR, "INTERNAL_ERROR", 500),
    (Code::DATABASE_ERROR, "DATABASE_ERROR", 500),
    (Code::SERVICE_ERROR, "SERVICE_ERROR", 500),
    (Code::CONFIGURATION_ERROR, "CONFIGURATION_ERROR", 500),
    (Code::DEPENDENCY_ERROR, "DEPENDENCY_ERROR", 500),
    (Code::SYSTEM_ERROR, "SYSTEM_ERROR", 500),
    (Code::MAINTENANCE_MODE, "MAINTENANCE_MODE", 503),
    (Code::UNKNOWN_ERROR, "UNKNOWN_ERROR", 500),
];

fn builtin(code: Code) -> Option<&'static (Code, &'static str, u16)> {
    BUILTIN_CODES.iter().find(|(c, _, _)| *c == code)
}

/// Registry counts by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CodeStats {
    /// Codes with a registered message.
    pub total: usize,
    /// Built-in success codes.
    pub success: usize,
    /// Built-in error codes.
    pub error: usize,
    /// Codes outside the built-in table.
    pub custom: usize,
}

/// Thread-safe mapping from [`Code`] to message id and HTTP status.
///
/// Messages and statuses are stored independently so either can be set on
/// its own. Unknown codes resolve to [`UNKNOWN_ERROR_MESSAGE`] and
/// [`DEFAULT_HTTP_STATUS`].
#[derive(Debug)]
pub struct CodeRegistry {
    messages: DashMap<Code, String>,
    statuses: DashMap<Code, u16>,
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CodeRegistry {
    /// Creates a registry, optionally preloaded with [`BUILTIN_CODES`].
    pub fn new(builtin: bool) -> Self {
        let registry = Self::empty();
        if builtin {
            registry.load_builtin_force();
        }
        registry
    }

    /// Creates a registry with no codes.
    pub fn empty() -> Self {
        Self {
            messages: DashMap::new(),
            statuses: DashMap::new(),
        }
    }

    /// Message id for `code`.
    pub fn message(&self, code: Code) -> String {
        self.messages
            .get(&code)
            .map_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string(), |m| m.value().clone())
    }

    /// HTTP status for `code`.
    pub fn http_status(&self, code: Code) -> u16 {
        self.statuses.get(&code).map_or(DEFAULT_HTTP_STATUS, |s| *s.value())
    }

    /// Whether `code` has a registered message.
    pub fn contains(&self, code: Code) -> bool {
        self.messages.contains_key(&code)
    }

    /// Classification of `code`.
    pub const fn category(&self, code: Code) -> CodeCategory {
        code.category()
    }

    /// Registers or replaces a code.
    pub fn register(&self, code: impl Into<Code>, message: impl Into<String>, http_status: u16) {
        let code = code.into();
        self.messages.insert(code, message.into());
        self.statuses.insert(code, http_status);
        debug!("Registered response code {}", code);
    }

    /// Registers every definition.
    pub fn register_batch(&self, definitions: impl IntoIterator<Item = CodeDefinition>) {
        for definition in definitions {
            self.register(definition.code, definition.message, definition.http_status);
        }
    }

    /// Sets only the message id of `code`.
    pub fn set_message(&self, code: impl Into<Code>, message: impl Into<String>) {
        self.messages.insert(code.into(), message.into());
    }

    /// Sets only the HTTP status of `code`.
    pub fn set_http_status(&self, code: impl Into<Code>, http_status: u16) {
        self.statuses.insert(code.into(), http_status);
    }

    /// Removes `code`. Returns whether it was registered.
    pub fn unregister(&self, code: Code) -> bool {
        let had_status = self.statuses.remove(&code).is_some();
        self.messages.remove(&code).is_some() || had_status
    }

    /// Adds the built-in codes without overwriting existing entries.
    pub fn load_builtin(&self) {
        for &(code, message, status) in BUILTIN_CODES {
            self.messages.entry(code).or_insert_with(|| message.to_string());
            self.statuses.entry(code).or_insert(status);
        }
    }

    /// Adds the built-in codes, overwriting existing entries.
    pub fn load_builtin_force(&self) {
        for &(code, message, status) in BUILTIN_CODES {
            self.messages.insert(code, message.to_string());
            self.statuses.insert(code, status);
        }
    }

    /// Removes every code.
    pub fn reset(&self) {
        self.messages.clear();
        self.statuses.clear();
    }

    /// Copy of the registered messages, ordered by code.
    pub fn registered(&self) -> BTreeMap<Code, String> {
        self.messages
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Every registered code with its message and status, ordered by code.
    pub fn definitions(&self) -> Vec<CodeDefinition> {
        self.registered()
            .into_iter()
            .map(|(code, message)| CodeDefinition {
                code,
                message,
                http_status: self.http_status(code),
            })
            .collect()
    }

    /// Counts registered codes by kind.
    pub fn stats(&self) -> CodeStats {
        self.messages
            .iter()
            .fold(CodeStats::default(), |mut stats, entry| {
                let code = *entry.key();
                stats.total += 1;
                if !code.is_builtin() {
                    stats.custom += 1;
                } else if code.is_success() {
                    stats.success += 1;
                } else {
                    stats.error += 1;
                }
                stats
            })
    }
}
