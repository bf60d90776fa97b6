//! The JSON response envelope and a builder that localizes it.
//!
//! ```json
//! {
//!   "code": 1101,
//!   "message": "User not found",
//!   "meta": { "request_id": "req_...", "language": "en", "timestamp": "..." }
//! }
//! ```

use crate::codes::{Code, CodeRegistry};
use crate::error::{ApiError, ApiErrorBody};
use chrono::{DateTime, Utc};
use parlance_i18n::{I18nService, RequestLocale, TemplateData};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
/// Header carrying the trace id.
pub const TRACE_ID_HEADER: &str = "X-Trace-ID";
/// Header carrying the response language.
pub const CONTENT_LANGUAGE_HEADER: &str = "Content-Language";

/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Uniform response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    /// Application code.
    pub code: Code,
    /// Localized message for `code`.
    pub message: String,
    /// Payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Request metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Request id echoed from `X-Request-ID` or generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Language the message was rendered in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Time the response was built.
    pub timestamp: DateTime<Utc>,
    /// Trace id echoed from `X-Trace-ID`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// API version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Page information for list responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl Meta {
    /// Metadata stamped with the current time.
    pub fn now() -> Self {
        Self {
            request_id: None,
            language: None,
            timestamp: Utc::now(),
            trace_id: None,
            version: None,
            pagination: None,
        }
    }
}

/// Page information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
    /// Number of pages.
    pub total_pages: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
}

impl Pagination {
    /// Computes page counts. A zero `per_page` yields zero pages.
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page))
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Page and page size requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Items per page, at most [`MAX_PER_PAGE`].
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Reads `page` and `per_page` query values.
    ///
    /// Missing, malformed or non-positive values use the defaults (1 and
    /// [`DEFAULT_PER_PAGE`]); `per_page` is capped at [`MAX_PER_PAGE`].
    pub fn from_query(page: Option<&str>, per_page: Option<&str>) -> Self {
        let defaults = Self::default();
        let positive = |value: Option<&str>| {
            value
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|&v| v > 0)
        };
        Self {
            page: positive(page).unwrap_or(defaults.page),
            per_page: positive(per_page)
                .unwrap_or(defaults.per_page)
                .min(MAX_PER_PAGE),
        }
    }

    /// Reads `page` and `per_page` from a raw query string such as
    /// `page=2&per_page=20`.
    pub fn from_query_string(query: &str) -> Self {
        let lookup = |name: &str| {
            query
                .trim_start_matches('?')
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value)
        };
        Self::from_query(lookup("page"), lookup("per_page"))
    }

    /// Number of items to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Page information for `total` items.
    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination::new(self.page, self.per_page, total)
    }
}

/// A built response: HTTP status plus body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply<T> {
    /// HTTP status to send.
    pub status: u16,
    /// JSON body.
    pub body: Response<T>,
}

impl<T> Reply<T> {
    /// Headers derived from the body's metadata.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        self.body.meta.as_ref().map(response_headers).unwrap_or_default()
    }
}

/// `X-Request-ID`, `X-Trace-ID` and `Content-Language` headers for `meta`.
/// Absent values produce no header.
pub fn response_headers(meta: &Meta) -> Vec<(&'static str, String)> {
    [
        (REQUEST_ID_HEADER, &meta.request_id),
        (TRACE_ID_HEADER, &meta.trace_id),
        (CONTENT_LANGUAGE_HEADER, &meta.language),
    ]
    .into_iter()
    .filter_map(|(name, value)| {
        value
            .as_ref()
            .filter(|v| !v.is_empty())
            .map(|v| (name, v.clone()))
    })
    .collect()
}

/// A fresh request id of the form `req_<uuid>`.
pub fn generate_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().simple())
}

/// Builds localized responses for one request.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    i18n: Arc<I18nService>,
    codes: Arc<CodeRegistry>,
    locale: RequestLocale,
    request_id: String,
    trace_id: Option<String>,
    version: Option<String>,
}

impl ResponseBuilder {
    /// Creates a builder with a generated request id.
    pub fn new(i18n: Arc<I18nService>, codes: Arc<CodeRegistry>, locale: RequestLocale) -> Self {
        Self {
            i18n,
            codes,
            locale,
            request_id: generate_request_id(),
            trace_id: None,
            version: None,
        }
    }

    /// Uses the client's `X-Request-ID` value when present and non-empty.
    #[must_use]
    pub fn with_request_id(mut self, header: Option<&str>) -> Self {
        if let Some(id) = header.map(str::trim).filter(|id| !id.is_empty()) {
            self.request_id = id.to_string();
        }
        self
    }

    /// Echoes the client's `X-Trace-ID` value when present and non-empty.
    #[must_use]
    pub fn with_trace_id(mut self, header: Option<&str>) -> Self {
        self.trace_id = header
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string);
        self
    }

    /// Stamps an API version into the metadata.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The locale responses are rendered in.
    pub const fn locale(&self) -> &RequestLocale {
        &self.locale
    }

    /// The request id stamped into every response.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Builds a response for `code`, translating its message id.
    pub fn respond<T>(&self, code: Code, data: Option<T>) -> Reply<T> {
        self.with_template(code, data, &TemplateData::new())
    }

    /// Like [`ResponseBuilder::respond`] but substitutes `template_data`
    /// into the message.
    pub fn with_template<T>(
        &self,
        code: Code,
        data: Option<T>,
        template_data: &TemplateData,
    ) -> Reply<T> {
        let message_id = self.codes.message(code);
        let message = self.i18n.translate_for(&self.locale, &message_id, template_data);
        self.build(code, message, data, None)
    }

    /// Success response carrying `data`.
    pub fn success<T>(&self, data: T) -> Reply<T> {
        self.respond(Code::SUCCESS, Some(data))
    }

    /// Error response without payload.
    pub fn error(&self, code: Code) -> Reply<()> {
        self.respond(code, None)
    }

    /// Error response with a caller-supplied message that is not translated.
    pub fn error_with_message(&self, code: Code, message: impl Into<String>) -> Reply<()> {
        self.build(code, message.into(), None, None)
    }

    /// Error response for an [`ApiError`]; the error body becomes the payload.
    pub fn api_error(&self, error: &ApiError) -> Reply<ApiErrorBody> {
        debug!("Responding with {}", error);
        self.respond(error.response_code(), Some(error.body()))
    }

    /// Response carrying one page of data.
    pub fn paginated<T>(&self, code: Code, data: T, pagination: Pagination) -> Reply<T> {
        let message_id = self.codes.message(code);
        let message = self
            .i18n
            .translate_for(&self.locale, &message_id, &TemplateData::new());
        self.build(code, message, Some(data), Some(pagination))
    }

    /// Response carrying `items` as one page of `total`.
    pub fn list<T>(&self, code: Code, items: Vec<T>, total: u64, page: PageRequest) -> Reply<Vec<T>> {
        self.paginated(code, items, page.pagination(total))
    }

    fn build<T>(
        &self,
        code: Code,
        message: String,
        data: Option<T>,
        pagination: Option<Pagination>,
    ) -> Reply<T> {
        let meta = Meta {
            request_id: Some(self.request_id.clone()),
            language: Some(self.locale.language.to_string()),
            timestamp: Utc::now(),
            trace_id: self.trace_id.clone(),
            version: self.version.clone(),
            pagination,
        };
        Reply {
            status: self.codes.http_status(code),
            body: Response {
                code,
                message,
                data,
                meta: Some(meta),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(2, 10, 35);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next);
        assert!(p.has_prev);

        let last = Pagination::new(4, 10, 35);
        assert!(!last.has_next);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);

        assert_eq!(Pagination::new(1, 0, 10).total_pages, 0);
    }

    #[test]
    fn test_page_request_defaults_and_cap() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest::default());
        assert_eq!(
            PageRequest::from_query(Some("3"), Some("500")),
            PageRequest { page: 3, per_page: MAX_PER_PAGE }
        );
        assert_eq!(
            PageRequest::from_query(Some("0"), Some("abc")),
            PageRequest::default()
        );

        let request = PageRequest::from_query_string("?per_page=20&page=2");
        assert_eq!(request, PageRequest { page: 2, per_page: 20 });
        assert_eq!(request.offset(), 20);
    }

    #[test]
    fn test_headers_skip_missing_values() {
        let mut meta = Meta::now();
        meta.request_id = Some("req_1".to_string());
        meta.language = Some("zh-CN".to_string());

        assert_eq!(
            response_headers(&meta),
            vec![
                (REQUEST_ID_HEADER, "req_1".to_string()),
                (CONTENT_LANGUAGE_HEADER, "zh-CN".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_id_format() {
        let id = generate_request_id();
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), 4 + 32);
        assert_ne!(id, generate_request_id());
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let body: Response<()> = Response {
            code: Code::SUCCESS,
            message: "Success".to_string(),
            data: None,
            meta: None,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"code":0,"message":"Success"}"#
        );
    }
}
